// Options panel shared by the main menu and the pause menu.
use bevy::prelude::*;

use crate::menu::{NORMAL_BUTTON, spawn_button};
use crate::settings::GameSettings;

pub struct OptionsPlugin;

impl Plugin for OptionsPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<OptionsClosed>()
            .add_systems(Update, (option_buttons, refresh_labels).chain());
    }
}

const VOLUME_STEP: f32 = 0.1;
const FOV_STEP: f32 = 5.0;
const SENSITIVITY_STEP: f32 = 50.0;

/// Where the panel was opened from, so Back knows what to return to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsOrigin {
    MainMenu,
    Pause,
}

#[derive(Component)]
pub struct OptionsPanel {
    pub origin: OptionsOrigin,
}

/// The panel was closed with its Back button.
#[derive(Message, Debug, Clone, Copy)]
pub struct OptionsClosed {
    pub origin: OptionsOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Setting {
    Volume,
    Fov,
    Sensitivity,
}

impl Setting {
    fn title(self) -> &'static str {
        match self {
            Setting::Volume => "Volume",
            Setting::Fov => "Field of View",
            Setting::Sensitivity => "Mouse Sensitivity",
        }
    }

    fn label(self, settings: &GameSettings) -> String {
        match self {
            Setting::Volume => settings.volume_label(),
            Setting::Fov => settings.fov_label(),
            Setting::Sensitivity => settings.sensitivity_label(),
        }
    }

    /// Step the setting by `direction` (-1 or +1) notches.
    fn nudge(self, settings: &mut GameSettings, direction: f32) {
        match self {
            Setting::Volume => {
                let value = settings.master_volume() + VOLUME_STEP * direction;
                settings.set_master_volume(value);
            }
            Setting::Fov => {
                let value = settings.fov() + FOV_STEP * direction;
                settings.set_fov(value);
            }
            Setting::Sensitivity => {
                let value = settings.mouse_sensitivity() + SENSITIVITY_STEP * direction;
                settings.set_mouse_sensitivity(value);
            }
        }
    }
}

#[derive(Component, Debug, Clone, Copy)]
enum OptionsButton {
    Decrease(Setting),
    Increase(Setting),
    Reset,
    Back,
}

#[derive(Component)]
struct OptionLabel(Setting);

pub fn spawn_options_panel(commands: &mut Commands, settings: &GameSettings, origin: OptionsOrigin) {
    commands
        .spawn((
            OptionsPanel { origin },
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(16.0),
                position_type: PositionType::Absolute,
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.85)),
            GlobalZIndex(150),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(match origin {
                    OptionsOrigin::MainMenu => "Options",
                    OptionsOrigin::Pause => "Paused",
                }),
                TextFont {
                    font_size: 36.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));

            for setting in [Setting::Volume, Setting::Fov, Setting::Sensitivity] {
                spawn_setting_row(parent, setting, settings);
            }

            spawn_button(parent, "Reset", OptionsButton::Reset);
            spawn_button(parent, "Back", OptionsButton::Back);
        });
}

fn spawn_setting_row(parent: &mut ChildSpawnerCommands, setting: Setting, settings: &GameSettings) {
    parent
        .spawn(Node {
            flex_direction: FlexDirection::Row,
            align_items: AlignItems::Center,
            column_gap: Val::Px(12.0),
            ..default()
        })
        .with_children(|row| {
            row.spawn((
                Text::new(setting.title()),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(Color::srgba(0.8, 0.8, 0.8, 1.0)),
                Node {
                    width: Val::Px(200.0),
                    ..default()
                },
            ));
            spawn_small_button(row, "-", OptionsButton::Decrease(setting));
            row.spawn((
                OptionLabel(setting),
                Text::new(setting.label(settings)),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                Node {
                    width: Val::Px(64.0),
                    justify_content: JustifyContent::Center,
                    ..default()
                },
            ));
            spawn_small_button(row, "+", OptionsButton::Increase(setting));
        });
}

fn spawn_small_button(parent: &mut ChildSpawnerCommands, label: &str, marker: OptionsButton) {
    parent
        .spawn((
            marker,
            Button,
            Node {
                width: Val::Px(40.0),
                height: Val::Px(40.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                border: UiRect::all(Val::Px(2.0)),
                ..default()
            },
            BorderColor::all(Color::srgba(1.0, 1.0, 1.0, 0.3)),
            BackgroundColor(NORMAL_BUTTON),
        ))
        .with_children(|btn| {
            btn.spawn((
                Text::new(label),
                TextFont {
                    font_size: 24.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
        });
}

fn option_buttons(
    mut commands: Commands,
    query: Query<(&Interaction, &OptionsButton), Changed<Interaction>>,
    panels: Query<(Entity, &OptionsPanel)>,
    mut settings: ResMut<GameSettings>,
    mut closed: MessageWriter<OptionsClosed>,
) {
    for (interaction, button) in &query {
        if *interaction != Interaction::Pressed {
            continue;
        }
        match *button {
            OptionsButton::Decrease(setting) => setting.nudge(&mut settings, -1.0),
            OptionsButton::Increase(setting) => setting.nudge(&mut settings, 1.0),
            OptionsButton::Reset => {
                settings.reset_to_defaults();
                info!("Settings reset to defaults");
            }
            OptionsButton::Back => {
                for (entity, panel) in &panels {
                    commands.entity(entity).despawn();
                    closed.write(OptionsClosed {
                        origin: panel.origin,
                    });
                }
            }
        }
    }
}

fn refresh_labels(settings: Res<GameSettings>, mut labels: Query<(&OptionLabel, &mut Text)>) {
    if !settings.is_changed() {
        return;
    }
    for (label, mut text) in &mut labels {
        text.0 = label.0.label(&settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsStore;

    #[test]
    fn nudges_step_and_clamp() {
        let mut settings = GameSettings::from_store(SettingsStore::in_memory());
        Setting::Volume.nudge(&mut settings, 1.0);
        assert_eq!(settings.master_volume(), 1.0);
        Setting::Volume.nudge(&mut settings, -1.0);
        assert!((settings.master_volume() - 0.9).abs() < 1e-5);

        Setting::Fov.nudge(&mut settings, 1.0);
        assert_eq!(settings.fov(), 65.0);
        Setting::Sensitivity.nudge(&mut settings, -1.0);
        assert_eq!(settings.mouse_sensitivity(), 150.0);
        assert_eq!(Setting::Sensitivity.label(&settings), "1");
    }
}

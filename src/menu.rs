// Main menu
use bevy::prelude::*;

use crate::options::{OptionsOrigin, OptionsPanel, spawn_options_panel};
use crate::scenes::{GameFlags, GameScene};
use crate::settings::GameSettings;

pub struct MenuPlugin;

impl Plugin for MenuPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameScene::MainMenu), setup_menu)
            .add_systems(OnExit(GameScene::MainMenu), close_options)
            .add_systems(Update, button_visuals)
            .add_systems(
                Update,
                button_actions.run_if(in_state(GameScene::MainMenu)),
            );
    }
}

pub const NORMAL_BUTTON: Color = Color::srgb(0.15, 0.15, 0.15);
const HOVERED_BUTTON: Color = Color::srgb(0.25, 0.25, 0.25);
const PRESSED_BUTTON: Color = Color::srgb(0.35, 0.35, 0.35);

#[derive(Component)]
enum MenuButton {
    Start,
    Options,
    #[cfg(not(target_arch = "wasm32"))]
    Exit,
}

fn setup_menu(mut commands: Commands) {
    // Root container.
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(24.0),
                ..default()
            },
            BackgroundColor(Color::BLACK),
            DespawnOnExit(GameScene::MainMenu),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Hollow House"),
                TextFont {
                    font_size: 64.0,
                    ..default()
                },
                TextColor(Color::srgb(0.75, 0.72, 0.65)),
                Node {
                    margin: UiRect::bottom(Val::Px(32.0)),
                    ..default()
                },
            ));

            spawn_button(parent, "Start", MenuButton::Start);
            spawn_button(parent, "Options", MenuButton::Options);

            // Exit button (native only).
            #[cfg(not(target_arch = "wasm32"))]
            spawn_button(parent, "Exit", MenuButton::Exit);
        });
}

pub fn spawn_button(parent: &mut ChildSpawnerCommands, label: &str, marker: impl Component) {
    parent
        .spawn((
            marker,
            Button,
            Node {
                width: Val::Px(200.0),
                height: Val::Px(50.0),
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

fn button_visuals(
    mut query: Query<
        (&Interaction, &mut BackgroundColor, &mut BorderColor),
        (Changed<Interaction>, With<Button>),
    >,
) {
    for (interaction, mut bg, mut border) in &mut query {
        match *interaction {
            Interaction::Pressed => {
                *bg = PRESSED_BUTTON.into();
                *border = BorderColor::all(Color::WHITE);
            }
            Interaction::Hovered => {
                *bg = HOVERED_BUTTON.into();
                *border = BorderColor::all(Color::WHITE);
            }
            Interaction::None => {
                *bg = NORMAL_BUTTON.into();
                *border = BorderColor::all(Color::srgba(1.0, 1.0, 1.0, 0.3));
            }
        }
    }
}

fn button_actions(
    mut commands: Commands,
    query: Query<(&Interaction, &MenuButton), Changed<Interaction>>,
    panels: Query<(), With<OptionsPanel>>,
    settings: Res<GameSettings>,
    mut flags: ResMut<GameFlags>,
    mut next_scene: ResMut<NextState<GameScene>>,
    #[cfg(not(target_arch = "wasm32"))] mut exit: MessageWriter<AppExit>,
) {
    for (interaction, button) in &query {
        if *interaction != Interaction::Pressed {
            continue;
        }
        match button {
            MenuButton::Start => {
                flags.reset();
                next_scene.set(GameScene::House);
            }
            MenuButton::Options => {
                if panels.is_empty() {
                    spawn_options_panel(&mut commands, &settings, OptionsOrigin::MainMenu);
                }
            }
            #[cfg(not(target_arch = "wasm32"))]
            MenuButton::Exit => {
                info!("Exiting from the main menu");
                exit.write(AppExit::Success);
            }
        }
    }
}

fn close_options(mut commands: Commands, panels: Query<Entity, With<OptionsPanel>>) {
    for entity in &panels {
        commands.entity(entity).despawn();
    }
}

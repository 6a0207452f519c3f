// Full-screen overlay shared by every sequence, and the door fade-and-teleport.
use bevy::prelude::*;
use bevy::ui::FocusPolicy;

use crate::interactor::Interactor;
use crate::player::{Player, PlayerControl, PlayerLook, teleport};
use crate::scenes::{GameFlags, GameScene};
use crate::sound::{SoundBank, play_once};
use crate::timeline::{Channel, Step, Timeline};

pub struct FaderPlugin;

impl Plugin for FaderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ScreenTint>()
            .add_systems(Startup, spawn_overlay)
            .add_systems(Update, run_fade_teleport.run_if(in_state(GameScene::House)))
            .add_systems(PostUpdate, apply_screen_tint)
            .add_systems(OnExit(GameScene::House), |mut commands: Commands| {
                commands.remove_resource::<FadeTeleport>();
            });
    }
}

const FADE_SECS: f32 = 1.0;
const DOOR_CLOSE_VOLUME: f32 = 0.6;

#[derive(Component)]
struct ScreenOverlay;

/// Colour and opacity of the overlay drawn above the world and the HUD.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct ScreenTint {
    pub rgb: Vec3,
    pub alpha: f32,
}

impl Default for ScreenTint {
    fn default() -> Self {
        Self::black(0.0)
    }
}

impl ScreenTint {
    pub fn black(alpha: f32) -> Self {
        Self {
            rgb: Vec3::ZERO,
            alpha,
        }
    }

    pub fn white(alpha: f32) -> Self {
        Self {
            rgb: Vec3::ONE,
            alpha,
        }
    }

    fn color(&self) -> Color {
        Color::srgba(self.rgb.x, self.rgb.y, self.rgb.z, self.alpha.clamp(0.0, 1.0))
    }
}

fn spawn_overlay(mut commands: Commands) {
    commands.spawn((
        ScreenOverlay,
        Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            position_type: PositionType::Absolute,
            ..default()
        },
        BackgroundColor(Color::NONE),
        GlobalZIndex(100),
        FocusPolicy::Pass,
    ));
}

fn apply_screen_tint(
    tint: Res<ScreenTint>,
    mut overlay: Query<&mut BackgroundColor, With<ScreenOverlay>>,
) {
    if !tint.is_changed() {
        return;
    }
    for mut bg in &mut overlay {
        bg.0 = tint.color();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FadeCue {
    Teleport,
    Release,
}

#[derive(Resource)]
pub(crate) struct FadeTeleport {
    timeline: Timeline<FadeCue>,
    target: Transform,
}

/// Fade to black, move the player to `target`, fade back. The caller has
/// already locked player input; it is released when the fade clears.
pub fn fade_and_teleport(commands: &mut Commands, target: Transform) {
    commands.insert_resource(FadeTeleport {
        timeline: Timeline::new([
            Step::fade(0.0, 1.0, FADE_SECS),
            Step::Cue(FadeCue::Teleport),
            Step::fade(1.0, 0.0, FADE_SECS),
            Step::Cue(FadeCue::Release),
        ]),
        target,
    });
}

pub(crate) fn run_fade_teleport(
    mut commands: Commands,
    time: Res<Time>,
    fade: Option<ResMut<FadeTeleport>>,
    mut tint: ResMut<ScreenTint>,
    bank: Res<SoundBank>,
    flags: Res<GameFlags>,
    mut player: Query<
        (
            &mut Transform,
            &mut PlayerLook,
            &mut PlayerControl,
            &mut Interactor,
        ),
        With<Player>,
    >,
) {
    let Some(mut fade) = fade else {
        return;
    };
    // An ending owns the screen and the player from here on.
    if flags.ending_triggered() {
        debug!("Door fade dropped for the ending");
        commands.remove_resource::<FadeTeleport>();
        return;
    }

    let frame = fade.timeline.advance(time.delta_secs());
    if let Some(alpha) = frame.sample(Channel::Fade) {
        *tint = ScreenTint::black(alpha);
    }

    for cue in frame.cues {
        let Ok((mut transform, mut look, mut control, mut interactor)) = player.single_mut() else {
            warn!("Fade cue {cue:?} with no player to move");
            continue;
        };
        match cue {
            FadeCue::Teleport => {
                teleport(&mut transform, &mut look, &fade.target);
                play_once(&mut commands, &bank.door_close, DOOR_CLOSE_VOLUME);
                debug!("Teleported player to {}", fade.target.translation);
            }
            FadeCue::Release => {
                control.unlock();
                interactor.release();
            }
        }
    }

    if frame.finished {
        commands.remove_resource::<FadeTeleport>();
    }
}

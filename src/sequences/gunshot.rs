// Shooting the pursuer: a white flash, then darkness and the padded room.
use bevy::prelude::*;

use crate::fader::ScreenTint;
use crate::player::{Player, PlayerControl};
use crate::pursuer::Pursuer;
use crate::scenes::{GameFlags, GameScene};
use crate::sound::{SoundBank, play_once};
use crate::timeline::{Channel, Step, Timeline};

use super::StartSequence;

pub struct GunshotPlugin;

impl Plugin for GunshotPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (start_shot_ending, run_shot_ending)
                .chain()
                .run_if(in_state(GameScene::House)),
        )
        .add_systems(OnExit(GameScene::House), |mut commands: Commands| {
            commands.remove_resource::<ShotEnding>();
        });
    }
}

const GUNSHOT_VOLUME: f32 = 1.0;
const FLASH_SECS: f32 = 0.4;
const FADE_SECS: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum ShotCue {
    Darken,
    LoadPaddedRoom,
}

#[derive(Resource)]
struct ShotEnding {
    timeline: Timeline<ShotCue>,
    /// The overlay is still the white flash rather than the fade to black.
    flashing: bool,
}

fn start_shot_ending(
    mut commands: Commands,
    mut requests: MessageReader<StartSequence>,
    bank: Res<SoundBank>,
    mut flags: ResMut<GameFlags>,
    mut tint: ResMut<ScreenTint>,
    mut pursuers: Query<&mut Pursuer>,
    mut player: Query<&mut PlayerControl, With<Player>>,
) {
    for request in requests.read() {
        let StartSequence::Gunshot { pursuer } = request else {
            continue;
        };
        if flags.ending_triggered() {
            continue;
        }

        play_once(&mut commands, &bank.gunshot, GUNSHOT_VOLUME);
        *tint = ScreenTint::white(1.0);
        if let Ok(mut pursuer) = pursuers.get_mut(*pursuer) {
            pursuer.shoot();
        }
        flags.shot_ending_triggered = true;
        info!("Shot ending triggered");
        if let Ok(mut control) = player.single_mut() {
            control.lock();
        }

        commands.insert_resource(ShotEnding {
            timeline: Timeline::new([
                Step::fade(1.0, 0.0, FLASH_SECS),
                Step::Cue(ShotCue::Darken),
                Step::fade(0.0, 1.0, FADE_SECS),
                Step::Cue(ShotCue::LoadPaddedRoom),
            ]),
            flashing: true,
        });
    }
}

fn run_shot_ending(
    mut commands: Commands,
    time: Res<Time>,
    ending: Option<ResMut<ShotEnding>>,
    mut tint: ResMut<ScreenTint>,
    mut next_scene: ResMut<NextState<GameScene>>,
) {
    let Some(mut ending) = ending else {
        return;
    };
    let frame = ending.timeline.advance(time.delta_secs());

    // Cues come before the samples that follow them in the same frame.
    for cue in &frame.cues {
        match cue {
            ShotCue::Darken => ending.flashing = false,
            ShotCue::LoadPaddedRoom => next_scene.set(GameScene::PaddedRoom),
        }
    }
    if let Some(alpha) = frame.sample(Channel::Fade) {
        *tint = if ending.flashing {
            ScreenTint::white(alpha)
        } else {
            ScreenTint::black(alpha)
        };
    }

    if frame.finished {
        commands.remove_resource::<ShotEnding>();
    }
}

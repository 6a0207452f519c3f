// The pursuer: wakes up at the final door, walks straight at the player, ends the night on contact.
use bevy::prelude::*;

use crate::fader::ScreenTint;
use crate::interactor::Interactor;
use crate::pause::gameplay_running;
use crate::player::{Player, PlayerControl};
use crate::scenes::{GameFlags, GameScene};
use crate::sound::{SoundBank, play_once};
use crate::timeline::{Channel, Step, Timeline};

pub struct PursuerPlugin;

impl Plugin for PursuerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (chase_player, catch_player)
                .chain()
                .run_if(in_state(GameScene::House).and(gameplay_running)),
        )
        .add_systems(
            Update,
            run_caught_ending.run_if(in_state(GameScene::House)),
        )
        .add_systems(OnExit(GameScene::House), |mut commands: Commands| {
            commands.remove_resource::<CaughtEnding>();
        });
    }
}

const CAUGHT_BEAT_SECS: f32 = 1.5;
const CAUGHT_FADE_SECS: f32 = 1.0;
const KILL_VOLUME: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PursuerState {
    #[default]
    Inactive,
    Active,
    Caught,
    Shot,
}

#[derive(Component, Debug)]
pub struct Pursuer {
    pub state: PursuerState,
    pub speed: f32,
    /// Flat distance at which the player is caught.
    pub catch_radius: f32,
}

impl Default for Pursuer {
    fn default() -> Self {
        Self {
            state: PursuerState::Inactive,
            speed: 5.0,
            catch_radius: 0.9,
        }
    }
}

impl Pursuer {
    /// Start chasing. Only an inactive pursuer wakes up.
    pub fn activate(&mut self) -> bool {
        if self.state != PursuerState::Inactive {
            return false;
        }
        self.state = PursuerState::Active;
        info!("Pursuer activated");
        true
    }

    pub fn is_active(&self) -> bool {
        self.state == PursuerState::Active
    }

    pub fn shoot(&mut self) {
        self.state = PursuerState::Shot;
        info!("Pursuer shot");
    }

    fn catch(&mut self) {
        self.state = PursuerState::Caught;
        info!("Pursuer caught the player");
    }
}

/// One frame of walking from `from` toward `target` on the pursuer's own
/// height, never past the target.
pub fn chase_step(from: Vec3, target: Vec3, speed: f32, dt: f32) -> Vec3 {
    let flat_target = Vec3::new(target.x, from.y, target.z);
    let to_target = flat_target - from;
    let max_step = speed * dt;
    if to_target.length() <= max_step {
        flat_target
    } else {
        from + to_target.normalize() * max_step
    }
}

pub fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    a.xz().distance(b.xz())
}

fn chase_player(
    time: Res<Time>,
    player: Query<&Transform, With<Player>>,
    mut pursuers: Query<(&Pursuer, &mut Transform), Without<Player>>,
) {
    let Ok(player) = player.single() else {
        return;
    };
    for (pursuer, mut transform) in &mut pursuers {
        if !pursuer.is_active() {
            continue;
        }
        transform.translation = chase_step(
            transform.translation,
            player.translation,
            pursuer.speed,
            time.delta_secs(),
        );
        let facing = Vec3::new(
            player.translation.x,
            transform.translation.y,
            player.translation.z,
        );
        if facing.distance_squared(transform.translation) > f32::EPSILON {
            transform.look_at(facing, Vec3::Y);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CaughtCue {
    LoadHospital,
}

#[derive(Resource)]
struct CaughtEnding(Timeline<CaughtCue>);

fn catch_player(
    mut commands: Commands,
    mut flags: ResMut<GameFlags>,
    bank: Res<SoundBank>,
    mut player: Query<(&Transform, &mut PlayerControl, &mut Interactor), With<Player>>,
    mut pursuers: Query<(&mut Pursuer, &Transform), Without<Player>>,
) {
    let Ok((player_transform, mut control, mut interactor)) = player.single_mut() else {
        return;
    };
    for (mut pursuer, transform) in &mut pursuers {
        if !pursuer.is_active()
            || flat_distance(transform.translation, player_transform.translation)
                > pursuer.catch_radius
        {
            continue;
        }
        if flags.ending_triggered() {
            continue;
        }

        pursuer.catch();
        flags.caught_ending_triggered = true;
        info!("Caught ending triggered");
        play_once(&mut commands, &bank.kill, KILL_VOLUME);
        control.lock();
        interactor.busy();
        commands.insert_resource(CaughtEnding(Timeline::new([
            Step::Wait(CAUGHT_BEAT_SECS),
            Step::fade(0.0, 1.0, CAUGHT_FADE_SECS),
            Step::Cue(CaughtCue::LoadHospital),
        ])));
    }
}

fn run_caught_ending(
    mut commands: Commands,
    time: Res<Time>,
    ending: Option<ResMut<CaughtEnding>>,
    mut tint: ResMut<ScreenTint>,
    mut next_scene: ResMut<NextState<GameScene>>,
) {
    let Some(mut ending) = ending else {
        return;
    };
    let frame = ending.0.advance(time.delta_secs());
    if let Some(alpha) = frame.sample(Channel::Fade) {
        *tint = ScreenTint::black(alpha);
    }
    for cue in frame.cues {
        match cue {
            CaughtCue::LoadHospital => next_scene.set(GameScene::Hospital),
        }
    }
    if frame.finished {
        commands.remove_resource::<CaughtEnding>();
    }
}

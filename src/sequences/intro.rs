// Waking up in the house: black screen, ambience, fade in, then the camera rises from the bed.
use bevy::prelude::*;
use bevy::window::CursorOptions;

use super::release_player;
use crate::fader::ScreenTint;
use crate::house::{PLAYER_START, PLAYER_START_YAW};
use crate::interactor::Interactor;
use crate::player::{
    FOG_RADIUS_NEAR, FOG_RADIUS_WIDE, FogRadius, Player, PlayerControl, PlayerLook,
    set_cursor_grab,
};
use crate::scenes::{GameFlags, GameScene};
use crate::sound::{SoundBank, SoundPlayer, play_once};
use crate::timeline::{Channel, Ease, Step, Timeline};

pub struct IntroPlugin;

impl Plugin for IntroPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameScene::House), start_intro)
            .add_systems(Update, run_intro.run_if(in_state(GameScene::House)))
            .add_systems(OnExit(GameScene::House), |mut commands: Commands| {
                commands.remove_resource::<Intro>();
            });
    }
}

const DELAY_BEFORE_SOUND: f32 = 2.0;
const DELAY_BEFORE_FADE: f32 = 2.0;
const FADE_SECS: f32 = 2.0;
const WAKE_SECS: f32 = 3.0;
const AMBIENCE_VOLUME: f32 = 0.4;
const RUSTLE_VOLUME: f32 = 0.8;
const LYING_HEIGHT: f32 = 0.6;
/// Looking up at the ceiling from the pillow.
const LYING_PITCH: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq)]
enum IntroCue {
    Ambience,
    Rustle,
    HandOver,
}

#[derive(Resource)]
struct Intro {
    timeline: Timeline<IntroCue>,
    lying: Transform,
    standing: Transform,
}

fn intro_timeline() -> Timeline<IntroCue> {
    Timeline::new([
        Step::Wait(DELAY_BEFORE_SOUND),
        Step::Cue(IntroCue::Ambience),
        Step::Wait(DELAY_BEFORE_FADE),
        Step::Tween {
            channel: Channel::Fade,
            from: 1.0,
            to: 0.0,
            secs: FADE_SECS,
            ease: Ease::OutCirc,
        },
        Step::Cue(IntroCue::Rustle),
        Step::Tween {
            channel: Channel::Camera,
            from: 0.0,
            to: 1.0,
            secs: WAKE_SECS,
            ease: Ease::Linear,
        },
        Step::Cue(IntroCue::HandOver),
    ])
}

fn start_intro(
    mut commands: Commands,
    mut tint: ResMut<ScreenTint>,
    mut fog: ResMut<FogRadius>,
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
    *tint = ScreenTint::black(1.0);
    fog.0 = FOG_RADIUS_WIDE;

    let standing = Transform::from_translation(PLAYER_START)
        .with_rotation(Quat::from_rotation_y(PLAYER_START_YAW));
    let lying = Transform::from_translation(PLAYER_START.with_y(LYING_HEIGHT)).with_rotation(
        Quat::from_rotation_y(PLAYER_START_YAW) * Quat::from_rotation_x(LYING_PITCH),
    );

    if let Ok((mut transform, mut look, mut control, mut interactor)) = player.single_mut() {
        *transform = lying;
        look.yaw = PLAYER_START_YAW;
        look.pitch = LYING_PITCH;
        control.lock();
        interactor.busy();
    }

    commands.insert_resource(Intro {
        timeline: intro_timeline(),
        lying,
        standing,
    });
    info!("Intro started");
}

fn run_intro(
    mut commands: Commands,
    time: Res<Time>,
    flags: Res<GameFlags>,
    intro: Option<ResMut<Intro>>,
    bank: Res<SoundBank>,
    mut tint: ResMut<ScreenTint>,
    mut fog: ResMut<FogRadius>,
    mut player: Query<
        (
            &mut Transform,
            &mut PlayerLook,
            &mut PlayerControl,
            &mut Interactor,
        ),
        With<Player>,
    >,
    mut cursor: Query<&mut CursorOptions>,
) {
    let Some(mut intro) = intro else {
        return;
    };
    let frame = intro.timeline.advance(time.delta_secs());
    let Ok((mut transform, mut look, mut control, mut interactor)) = player.single_mut() else {
        return;
    };

    if let Some(alpha) = frame.sample(Channel::Fade) {
        *tint = ScreenTint::black(alpha);
    }
    if let Some(progress) = frame.sample(Channel::Camera) {
        transform.translation = intro.lying.translation.lerp(intro.standing.translation, progress);
        transform.rotation = intro.lying.rotation.slerp(intro.standing.rotation, progress);
    }

    for cue in frame.cues {
        match cue {
            IntroCue::Ambience => {
                let mut ambience = SoundPlayer::new(bank.ambience.clone(), AMBIENCE_VOLUME).looped();
                let entity = commands.spawn(DespawnOnExit(GameScene::House)).id();
                ambience.play(&mut commands, entity);
                commands.entity(entity).insert(ambience);
            }
            IntroCue::Rustle => {
                play_once(&mut commands, &bank.sheets_rustle, RUSTLE_VOLUME);
            }
            IntroCue::HandOver => {
                fog.0 = FOG_RADIUS_NEAR;
                look.yaw = PLAYER_START_YAW;
                look.pitch = 0.0;
                *transform = intro.standing;
                if let Ok(mut cursor) = cursor.single_mut() {
                    set_cursor_grab(&mut cursor, true);
                }
                release_player(&flags, &mut control, &mut interactor);
                info!("Intro finished, player has control");
            }
        }
    }

    if frame.finished {
        commands.remove_resource::<Intro>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use bevy::time::TimeUpdateStrategy;

    #[test]
    fn intro_wakes_the_player_and_hands_over_control() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)))
            .init_resource::<ScreenTint>()
            .init_resource::<GameFlags>()
            .init_resource::<FogRadius>()
            .init_resource::<SoundBank>()
            .add_systems(Startup, start_intro)
            .add_systems(Update, run_intro);
        let player = app
            .world_mut()
            .spawn((
                Player,
                PlayerLook {
                    yaw: 0.0,
                    pitch: 0.0,
                },
                PlayerControl::default(),
                Interactor::default(),
                Transform::default(),
            ))
            .id();
        app.world_mut().spawn(CursorOptions::default());

        app.update();
        assert_eq!(app.world().resource::<ScreenTint>().alpha, 1.0);
        assert!(app.world().get::<PlayerControl>(player).unwrap().movement_locked);
        assert_eq!(
            app.world().get::<Transform>(player).unwrap().translation.y,
            LYING_HEIGHT
        );

        // 2 + 2 + 2 + 3 seconds, with room to spare.
        for _ in 0..100 {
            app.update();
        }

        let world = app.world();
        assert_eq!(world.resource::<ScreenTint>().alpha, 0.0);
        assert_eq!(world.resource::<FogRadius>().0, FOG_RADIUS_NEAR);
        assert!(!world.get::<PlayerControl>(player).unwrap().movement_locked);
        assert!(world.get::<Interactor>(player).unwrap().is_idle());
        assert_eq!(
            world.get::<Transform>(player).unwrap().translation,
            PLAYER_START
        );
        assert!(!world.contains_resource::<Intro>());
    }
}

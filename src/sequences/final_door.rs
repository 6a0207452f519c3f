// The final door: three knocks, darkness, and the pursuer is loose.
use bevy::prelude::*;

use super::{StartSequence, release_player};
use crate::fader::ScreenTint;
use crate::interactor::Interactor;
use crate::player::{Player, PlayerControl, stop_footsteps, Footsteps};
use crate::pursuer::Pursuer;
use crate::scenes::{GameFlags, GameScene};
use crate::sound::{SoundBank, play_once};
use crate::timeline::{Channel, Step, Timeline};

pub struct FinalDoorPlugin;

impl Plugin for FinalDoorPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (start_final_door, run_final_door)
                .chain()
                .run_if(in_state(GameScene::House)),
        )
        .add_systems(OnExit(GameScene::House), |mut commands: Commands| {
            commands.remove_resource::<FinalDoorSequence>();
        });
    }
}

const KNOCKS: usize = 3;
const KNOCK_INTERVAL: f32 = 0.6;
const KNOCK_VOLUME: f32 = 1.0;
const FADE_SECS: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum FinalDoorCue {
    Knock,
    OpenDoor,
    Release,
}

#[derive(Resource)]
struct FinalDoorSequence {
    timeline: Timeline<FinalDoorCue>,
    door: Entity,
}

fn final_door_timeline() -> Timeline<FinalDoorCue> {
    let mut steps = Vec::new();
    for _ in 0..KNOCKS {
        steps.push(Step::Cue(FinalDoorCue::Knock));
        steps.push(Step::Wait(KNOCK_INTERVAL));
    }
    steps.extend([
        Step::fade(0.0, 1.0, FADE_SECS),
        Step::Cue(FinalDoorCue::OpenDoor),
        Step::fade(1.0, 0.0, FADE_SECS),
        Step::Cue(FinalDoorCue::Release),
    ]);
    Timeline::new(steps)
}

fn start_final_door(
    mut commands: Commands,
    mut requests: MessageReader<StartSequence>,
    mut player: Query<&mut PlayerControl, With<Player>>,
    mut footsteps: Query<(&mut Footsteps, Option<&AudioSink>)>,
) {
    for request in requests.read() {
        let StartSequence::FinalDoor { door } = request else {
            continue;
        };
        if let Ok(mut control) = player.single_mut() {
            control.lock();
        }
        stop_footsteps(&mut footsteps);
        commands.insert_resource(FinalDoorSequence {
            timeline: final_door_timeline(),
            door: *door,
        });
        info!("Final door sequence started");
    }
}

fn run_final_door(
    mut commands: Commands,
    time: Res<Time>,
    flags: Res<GameFlags>,
    sequence: Option<ResMut<FinalDoorSequence>>,
    bank: Res<SoundBank>,
    mut tint: ResMut<ScreenTint>,
    mut pursuers: Query<(Entity, &mut Pursuer)>,
    mut player: Query<(&mut PlayerControl, &mut Interactor), With<Player>>,
) {
    let Some(mut sequence) = sequence else {
        return;
    };
    let frame = sequence.timeline.advance(time.delta_secs());

    if let Some(alpha) = frame.sample(Channel::Fade) {
        *tint = ScreenTint::black(alpha);
    }

    for cue in frame.cues {
        match cue {
            FinalDoorCue::Knock => {
                play_once(&mut commands, &bank.knock, KNOCK_VOLUME);
            }
            FinalDoorCue::OpenDoor => {
                if let Ok(mut door) = commands.get_entity(sequence.door) {
                    door.despawn();
                }
                for (entity, mut pursuer) in &mut pursuers {
                    if pursuer.activate() {
                        commands.entity(entity).insert(Visibility::Inherited);
                    }
                }
            }
            FinalDoorCue::Release => {
                if let Ok((mut control, mut interactor)) = player.single_mut() {
                    release_player(&flags, &mut control, &mut interactor);
                }
            }
        }
    }

    if frame.finished {
        commands.remove_resource::<FinalDoorSequence>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use bevy::time::TimeUpdateStrategy;

    use crate::pursuer::PursuerState;

    #[test]
    fn knocks_then_opens_and_wakes_the_pursuer() {
        let mut timeline = final_door_timeline();
        let frame = timeline.advance(0.0);
        assert_eq!(frame.cues, vec![FinalDoorCue::Knock]);

        let frame = timeline.advance(KNOCK_INTERVAL * 2.0 + 0.01);
        assert_eq!(frame.cues, vec![FinalDoorCue::Knock, FinalDoorCue::Knock]);

        let frame = timeline.advance(KNOCK_INTERVAL + FADE_SECS);
        assert_eq!(frame.cues, vec![FinalDoorCue::OpenDoor]);
    }

    #[test]
    fn sequence_removes_the_door_and_releases_the_player() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)))
            .init_resource::<ScreenTint>()
            .init_resource::<GameFlags>()
            .init_resource::<SoundBank>()
            .add_message::<StartSequence>()
            .add_systems(Update, (start_final_door, run_final_door).chain());

        let player = app
            .world_mut()
            .spawn((Player, PlayerControl::default(), Interactor::default()))
            .id();
        let door = app.world_mut().spawn_empty().id();
        let pursuer = app
            .world_mut()
            .spawn((Pursuer::default(), Visibility::Hidden))
            .id();

        app.world_mut()
            .write_message(StartSequence::FinalDoor { door });
        app.update();
        assert!(app.world().get::<PlayerControl>(player).unwrap().movement_locked);

        // Three knocks, the fade out and the fade back in.
        for _ in 0..60 {
            app.update();
        }

        assert!(app.world().get_entity(door).is_err());
        assert_eq!(
            app.world().get::<Pursuer>(pursuer).unwrap().state,
            PursuerState::Active
        );
        assert_eq!(
            app.world().get::<Visibility>(pursuer),
            Some(&Visibility::Inherited)
        );
        assert!(!app.world().get::<PlayerControl>(player).unwrap().movement_locked);
        assert_eq!(app.world().resource::<ScreenTint>().alpha, 0.0);
    }
}

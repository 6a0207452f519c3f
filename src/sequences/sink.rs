// The bathroom sink: water runs, something knocks, the lights dip.
use bevy::prelude::*;

use super::{StartSequence, release_player};
use crate::fader::ScreenTint;
use crate::interactor::Interactor;
use crate::player::{Player, PlayerControl};
use crate::scenes::{GameFlags, GameScene};
use crate::sound::{SoundBank, SoundPlayer, play_once};
use crate::text_trigger::StartTextTrigger;
use crate::timeline::{Channel, Step, Timeline};

pub struct SinkPlugin;

impl Plugin for SinkPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (start_sink, run_sink).chain().run_if(in_state(GameScene::House)),
        )
        .add_systems(OnExit(GameScene::House), |mut commands: Commands| {
            commands.remove_resource::<SinkSequence>();
        });
    }
}

const WATER_SECS: f32 = 2.5;
const WATER_VOLUME: f32 = 0.7;
const KNOCK_VOLUME: f32 = 1.0;
const FLASH_IN_SECS: f32 = 0.1;
const FLASH_HOLD_SECS: f32 = 0.3;
const FLASH_OUT_SECS: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
enum SinkCue {
    StopWater,
    Finish,
}

#[derive(Resource)]
struct SinkSequence {
    timeline: Timeline<SinkCue>,
    water: Entity,
    message: Option<Entity>,
}

fn start_sink(
    mut commands: Commands,
    mut requests: MessageReader<StartSequence>,
    bank: Res<SoundBank>,
    mut player: Query<&mut PlayerControl, With<Player>>,
) {
    for request in requests.read() {
        let StartSequence::Sink { message } = request else {
            continue;
        };
        if let Ok(mut control) = player.single_mut() {
            control.lock();
        }

        let mut water = SoundPlayer::new(bank.water.clone(), WATER_VOLUME).looped();
        water.fade_in_secs = 0.3;
        let entity = commands.spawn(DespawnOnExit(GameScene::House)).id();
        water.play(&mut commands, entity);
        commands.entity(entity).insert(water);

        commands.insert_resource(SinkSequence {
            timeline: Timeline::new([
                Step::Wait(WATER_SECS),
                Step::Cue(SinkCue::StopWater),
                Step::fade(0.0, 1.0, FLASH_IN_SECS),
                Step::Wait(FLASH_HOLD_SECS),
                Step::fade(1.0, 0.0, FLASH_OUT_SECS),
                Step::Cue(SinkCue::Finish),
            ]),
            water: entity,
            message: *message,
        });
    }
}

fn run_sink(
    mut commands: Commands,
    time: Res<Time>,
    flags: Res<GameFlags>,
    sequence: Option<ResMut<SinkSequence>>,
    bank: Res<SoundBank>,
    mut tint: ResMut<ScreenTint>,
    mut water: Query<(&mut SoundPlayer, Option<&AudioSink>)>,
    mut player: Query<(&mut PlayerControl, &mut Interactor), With<Player>>,
    mut messages: MessageWriter<StartTextTrigger>,
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
            SinkCue::StopWater => {
                if let Ok((mut sound, sink)) = water.get_mut(sequence.water) {
                    sound.stop(&mut commands, sequence.water, sink);
                }
                play_once(&mut commands, &bank.knock, KNOCK_VOLUME);
            }
            SinkCue::Finish => {
                if let Some(message) = sequence.message {
                    messages.write(StartTextTrigger(message));
                }
                if let Ok((mut control, mut interactor)) = player.single_mut() {
                    release_player(&flags, &mut control, &mut interactor);
                }
            }
        }
    }

    if frame.finished {
        commands.remove_resource::<SinkSequence>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use bevy::time::TimeUpdateStrategy;

    #[derive(Resource, Default)]
    struct SentMessages(Vec<StartTextTrigger>);

    fn collect_messages(
        mut reader: MessageReader<StartTextTrigger>,
        mut sent: ResMut<SentMessages>,
    ) {
        sent.0.extend(reader.read().copied());
    }

    #[test]
    fn water_runs_then_knock_flash_and_message() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)))
            .init_resource::<ScreenTint>()
            .init_resource::<GameFlags>()
            .init_resource::<SoundBank>()
            .init_resource::<SentMessages>()
            .add_message::<StartSequence>()
            .add_message::<StartTextTrigger>()
            .add_systems(Update, (start_sink, run_sink, collect_messages).chain());

        let mut interactor = Interactor::default();
        interactor.busy();
        let player = app
            .world_mut()
            .spawn((Player, PlayerControl::default(), interactor))
            .id();
        let message = app.world_mut().spawn_empty().id();

        app.world_mut().write_message(StartSequence::Sink {
            message: Some(message),
        });
        app.update();
        assert!(app.world().get::<PlayerControl>(player).unwrap().movement_locked);
        let mut water = app
            .world_mut()
            .query_filtered::<Entity, With<SoundPlayer>>();
        let water = water.single(app.world()).unwrap();

        // Still inside the 2.5 s of running water.
        for _ in 0..20 {
            app.update();
        }
        assert!(app.world().get::<AudioPlayer>(water).is_some());
        assert_eq!(app.world().resource::<ScreenTint>().alpha, 0.0);
        assert!(app.world().resource::<SentMessages>().0.is_empty());

        // Water off and into the dark flash.
        for _ in 0..8 {
            app.update();
        }
        assert!(app.world().get::<AudioPlayer>(water).is_none());
        assert!(app.world().resource::<ScreenTint>().alpha > 0.0);
        assert!(app.world().get::<PlayerControl>(player).unwrap().movement_locked);

        for _ in 0..15 {
            app.update();
        }
        assert_eq!(
            app.world().resource::<SentMessages>().0,
            vec![StartTextTrigger(message)]
        );
        assert_eq!(app.world().resource::<ScreenTint>().alpha, 0.0);
        assert!(!app.world().get::<PlayerControl>(player).unwrap().movement_locked);
        assert!(app.world().get::<Interactor>(player).unwrap().is_idle());
        assert!(!app.world().contains_resource::<SinkSequence>());
    }
}

// Padded room ending: fade in, a few seconds of quiet, cut to black, credits.
use bevy::prelude::*;

use crate::fader::ScreenTint;
use crate::house::spawn_room_shell;
use crate::player::{EYE_HEIGHT, FOG_RADIUS_WIDE, FogRadius, Player, PlayerControl, PlayerLook, teleport};
use crate::scenes::GameScene;
use crate::timeline::{Channel, Step, Timeline};

pub struct PaddedRoomPlugin;

impl Plugin for PaddedRoomPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameScene::PaddedRoom), setup_padded_room)
            .add_systems(
                Update,
                run_padded_room.run_if(in_state(GameScene::PaddedRoom)),
            )
            .add_systems(OnExit(GameScene::PaddedRoom), |mut commands: Commands| {
                commands.remove_resource::<PaddedRoom>();
            });
    }
}

const FADE_IN_SECS: f32 = 2.0;
const WAIT_SECS: f32 = 3.0;
const BLACK_SECS: f32 = 3.0;
const PADDING_COLOR: Color = Color::srgb(0.85, 0.84, 0.78);

#[derive(Debug, Clone, Copy, PartialEq)]
enum PaddedCue {
    Cut,
    Credits,
}

#[derive(Resource)]
struct PaddedRoom(Timeline<PaddedCue>);

fn padded_room_timeline() -> Timeline<PaddedCue> {
    Timeline::new([
        Step::fade(1.0, 0.0, FADE_IN_SECS),
        Step::Wait(WAIT_SECS),
        Step::Cue(PaddedCue::Cut),
        Step::Wait(BLACK_SECS),
        Step::Cue(PaddedCue::Credits),
    ])
}

fn setup_padded_room(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut tint: ResMut<ScreenTint>,
    mut fog: ResMut<FogRadius>,
    mut player: Query<(&mut Transform, &mut PlayerLook, &mut PlayerControl), With<Player>>,
) {
    *tint = ScreenTint::black(1.0);
    fog.0 = FOG_RADIUS_WIDE;

    let material = materials.add(StandardMaterial {
        base_color: PADDING_COLOR,
        perceptual_roughness: 1.0,
        ..default()
    });
    spawn_room_shell(
        &mut commands,
        &mut meshes,
        material,
        Vec3::ZERO,
        Vec3::new(4.0, 3.0, 4.0),
        GameScene::PaddedRoom,
    );
    commands.spawn((
        PointLight {
            color: Color::srgb(0.95, 0.97, 1.0),
            intensity: 200_000.0,
            range: 12.0,
            ..default()
        },
        Transform::from_xyz(0.0, 2.8, 0.0),
        DespawnOnExit(GameScene::PaddedRoom),
    ));

    if let Ok((mut transform, mut look, mut control)) = player.single_mut() {
        teleport(
            &mut transform,
            &mut look,
            &Transform::from_xyz(0.0, EYE_HEIGHT, 1.2),
        );
        control.lock();
    }

    commands.insert_resource(PaddedRoom(padded_room_timeline()));
    info!("Padded room sequence started");
}

fn run_padded_room(
    mut commands: Commands,
    time: Res<Time>,
    sequence: Option<ResMut<PaddedRoom>>,
    mut tint: ResMut<ScreenTint>,
    mut next_scene: ResMut<NextState<GameScene>>,
) {
    let Some(mut sequence) = sequence else {
        return;
    };
    let frame = sequence.0.advance(time.delta_secs());
    if let Some(alpha) = frame.sample(Channel::Fade) {
        *tint = ScreenTint::black(alpha);
    }
    for cue in frame.cues {
        match cue {
            PaddedCue::Cut => *tint = ScreenTint::black(1.0),
            PaddedCue::Credits => next_scene.set(GameScene::Credits),
        }
    }
    if frame.finished {
        commands.remove_resource::<PaddedRoom>();
    }
}

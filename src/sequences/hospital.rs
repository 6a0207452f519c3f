// Hospital ending: wake up in a bed, look around for a while, then black.
use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::CursorOptions;

use crate::fader::ScreenTint;
use crate::house::spawn_room_shell;
use crate::player::{FOG_RADIUS_WIDE, FogRadius, Player, PlayerControl, PlayerLook, set_cursor_grab};
use crate::scenes::GameScene;
use crate::timeline::{Channel, Step, Timeline};

pub struct HospitalPlugin;

impl Plugin for HospitalPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameScene::Hospital), setup_hospital)
            .add_systems(
                Update,
                (run_hospital, look_around)
                    .chain()
                    .run_if(in_state(GameScene::Hospital)),
            )
            .add_systems(OnExit(GameScene::Hospital), |mut commands: Commands| {
                commands.remove_resource::<HospitalEnding>();
            });
    }
}

const FADE_IN_SECS: f32 = 2.0;
const LOOK_AROUND_SECS: f32 = 10.0;
const BLACK_SECS: f32 = 3.0;
/// Degrees of look per pixel of mouse motion.
const LOOK_DEGREES_PER_PIXEL: f32 = 0.1 * 2.0;
const PITCH_LIMIT_DEGREES: f32 = 30.0;
const BED_EYE: Vec3 = Vec3::new(0.0, 1.0, 0.0);

#[derive(Debug, Clone, Copy, PartialEq)]
enum HospitalCue {
    StartLooking,
    Cut,
    Credits,
}

#[derive(Resource)]
struct HospitalEnding {
    timeline: Timeline<HospitalCue>,
    looking: bool,
    initial: Quat,
    /// Degrees, relative to `initial`.
    yaw: f32,
    pitch: f32,
}

impl HospitalEnding {
    fn look(&mut self, delta: Vec2) -> Quat {
        self.yaw -= delta.x * LOOK_DEGREES_PER_PIXEL;
        self.pitch = (self.pitch - delta.y * LOOK_DEGREES_PER_PIXEL)
            .clamp(-PITCH_LIMIT_DEGREES, PITCH_LIMIT_DEGREES);
        self.initial
            * Quat::from_euler(
                EulerRot::YXZ,
                self.yaw.to_radians(),
                self.pitch.to_radians(),
                0.0,
            )
    }
}

fn setup_hospital(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut tint: ResMut<ScreenTint>,
    mut fog: ResMut<FogRadius>,
    mut player: Query<(&mut Transform, &mut PlayerLook, &mut PlayerControl), With<Player>>,
) {
    *tint = ScreenTint::black(1.0);
    fog.0 = FOG_RADIUS_WIDE;

    let walls = materials.add(StandardMaterial {
        base_color: Color::srgb(0.7, 0.78, 0.74),
        ..default()
    });
    spawn_room_shell(
        &mut commands,
        &mut meshes,
        walls,
        Vec3::ZERO,
        Vec3::new(6.0, 3.0, 8.0),
        GameScene::Hospital,
    );
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(1.2, 0.5, 2.2))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.92, 0.92, 0.9),
            ..default()
        })),
        Transform::from_xyz(0.0, 0.35, 0.6),
        DespawnOnExit(GameScene::Hospital),
    ));
    commands.spawn((
        PointLight {
            color: Color::srgb(0.9, 1.0, 0.95),
            intensity: 150_000.0,
            range: 15.0,
            ..default()
        },
        Transform::from_xyz(0.0, 2.8, -1.0),
        DespawnOnExit(GameScene::Hospital),
    ));

    // Sitting up in bed, facing the door.
    let initial = Quat::from_rotation_x(-0.15);
    if let Ok((mut transform, mut look, mut control)) = player.single_mut() {
        transform.translation = BED_EYE;
        transform.rotation = initial;
        look.yaw = 0.0;
        look.pitch = -0.15;
        control.lock();
    }

    commands.insert_resource(HospitalEnding {
        timeline: Timeline::new([
            Step::fade(1.0, 0.0, FADE_IN_SECS),
            Step::Cue(HospitalCue::StartLooking),
            Step::Wait(LOOK_AROUND_SECS),
            Step::Cue(HospitalCue::Cut),
            Step::Wait(BLACK_SECS),
            Step::Cue(HospitalCue::Credits),
        ]),
        looking: false,
        initial,
        yaw: 0.0,
        pitch: 0.0,
    });
    info!("Hospital ending started");
}

fn run_hospital(
    mut commands: Commands,
    time: Res<Time>,
    ending: Option<ResMut<HospitalEnding>>,
    mut tint: ResMut<ScreenTint>,
    mut cursor: Query<&mut CursorOptions>,
    mut next_scene: ResMut<NextState<GameScene>>,
) {
    let Some(mut ending) = ending else {
        return;
    };
    let frame = ending.timeline.advance(time.delta_secs());
    if let Some(alpha) = frame.sample(Channel::Fade) {
        *tint = ScreenTint::black(alpha);
    }
    for cue in frame.cues {
        match cue {
            HospitalCue::StartLooking => {
                ending.looking = true;
                if let Ok(mut cursor) = cursor.single_mut() {
                    set_cursor_grab(&mut cursor, true);
                }
                info!("Look around for {LOOK_AROUND_SECS} seconds");
            }
            HospitalCue::Cut => {
                ending.looking = false;
                if let Ok(mut cursor) = cursor.single_mut() {
                    set_cursor_grab(&mut cursor, false);
                }
                *tint = ScreenTint::black(1.0);
            }
            HospitalCue::Credits => next_scene.set(GameScene::Credits),
        }
    }
    if frame.finished {
        commands.remove_resource::<HospitalEnding>();
    }
}

fn look_around(
    mut motion: MessageReader<MouseMotion>,
    ending: Option<ResMut<HospitalEnding>>,
    mut player: Query<&mut Transform, With<Player>>,
) {
    let delta: Vec2 = motion.read().map(|ev| ev.delta).sum();
    let Some(mut ending) = ending else {
        return;
    };
    if !ending.looking || delta == Vec2::ZERO {
        return;
    }
    let Ok(mut transform) = player.single_mut() else {
        return;
    };
    transform.rotation = ending.look(delta);
}

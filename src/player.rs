// First-person camera controller with mouse look, keyboard movement and footsteps.
use bevy::audio::{AudioSinkPlayback, Volume};
use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, CursorOptions};
use rand::Rng;

use crate::interactor::Interactor;
use crate::pause::gameplay_running;
use crate::scenes::GameScene;
use crate::settings::GameSettings;
use crate::sound::SoundBank;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (spawn_player, spawn_footsteps))
            .insert_resource(ClearColor(Color::BLACK))
            .insert_resource(GlobalAmbientLight::NONE)
            .init_resource::<FogRadius>()
            .add_systems(
                Update,
                (mouse_look, player_movement, footsteps, clamp_to_rooms)
                    .chain()
                    .run_if(in_state(GameScene::House).and(gameplay_running)),
            )
            .add_systems(
                Update,
                (flicker_lantern, apply_fog_radius).run_if(in_state(GameScene::House)),
            )
            .add_systems(OnExit(GameScene::House), (hide_lantern, silence_footsteps))
            .add_systems(OnEnter(GameScene::MainMenu), release_cursor)
            .add_systems(OnEnter(GameScene::Credits), release_cursor);
    }
}

#[derive(Component)]
pub struct Player;

/// Tracks the player's yaw and pitch for composed camera rotation.
#[derive(Component)]
pub struct PlayerLook {
    pub yaw: f32,
    pub pitch: f32,
}

impl PlayerLook {
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }
}

/// Input gates flipped by sequences while they own the camera.
#[derive(Component, Default, Debug)]
pub struct PlayerControl {
    pub movement_locked: bool,
    pub look_locked: bool,
}

impl PlayerControl {
    pub fn lock(&mut self) {
        self.movement_locked = true;
        self.look_locked = true;
    }

    pub fn unlock(&mut self) {
        self.movement_locked = false;
        self.look_locked = false;
    }
}

#[derive(Component, Default)]
pub struct Footsteps {
    playing: bool,
}

/// Light carried once the lantern has been picked up.
#[derive(Component)]
pub struct HeldLantern {
    base_intensity: f32,
}

impl Default for HeldLantern {
    fn default() -> Self {
        Self {
            base_intensity: LANTERN_INTENSITY,
        }
    }
}

/// Walkable floor rectangle on the XZ plane.
#[derive(Component, Debug, Clone, Copy)]
pub struct Room {
    pub min: Vec2,
    pub max: Vec2,
}

impl Room {
    pub fn new(center: Vec2, half_size: Vec2) -> Self {
        Self {
            min: center - half_size,
            max: center + half_size,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min + CLAMP_MARGIN, self.max - CLAMP_MARGIN)
    }
}

/// Last room the player stood in. Walls clamp into it even when one long
/// frame carries the player past its edge.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CurrentRoom(pub Option<Entity>);

/// Distance at which the fog fully hides the scene.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct FogRadius(pub f32);

impl Default for FogRadius {
    fn default() -> Self {
        Self(FOG_RADIUS_WIDE)
    }
}

pub const EYE_HEIGHT: f32 = 1.6;
pub const FOG_RADIUS_WIDE: f32 = 20.0;
pub const FOG_RADIUS_NEAR: f32 = 10.0;

const WALK_SPEED: f32 = 6.0;
const MAX_PITCH: f32 = 1.3;
const FOOTSTEP_THRESHOLD: f32 = 0.1;
const FOOTSTEP_VOLUME: f32 = 0.5;
const CLAMP_MARGIN: f32 = 0.3;
const LANTERN_INTENSITY: f32 = 60_000.0;
const LANTERN_FLICKER: f32 = 0.08;
const FOG_COLOR: Color = Color::srgb(0.01, 0.01, 0.015);

fn spawn_player(mut commands: Commands, settings: Res<GameSettings>, fog: Res<FogRadius>) {
    commands
        .spawn((
            Player,
            PlayerLook {
                yaw: 0.0,
                pitch: 0.0,
            },
            PlayerControl::default(),
            Interactor::default(),
            CurrentRoom::default(),
            Camera3d::default(),
            Projection::from(PerspectiveProjection {
                fov: settings.fov().to_radians(),
                near: 0.01,
                ..default()
            }),
            DistanceFog {
                color: FOG_COLOR,
                falloff: fog_falloff(fog.0),
                ..default()
            },
            Transform::from_xyz(0.0, EYE_HEIGHT, 0.0),
        ))
        .with_children(|parent| {
            parent.spawn((
                HeldLantern::default(),
                PointLight {
                    color: Color::srgb(1.0, 0.75, 0.4),
                    intensity: LANTERN_INTENSITY,
                    range: 12.0,
                    shadows_enabled: true,
                    ..default()
                },
                Transform::from_xyz(0.3, -0.4, -0.3),
                Visibility::Hidden,
            ));
        });
}

fn spawn_footsteps(mut commands: Commands, bank: Res<SoundBank>) {
    commands.spawn((
        Footsteps::default(),
        AudioPlayer::new(bank.footsteps.clone()),
        PlaybackSettings::LOOP
            .paused()
            .with_volume(Volume::Linear(FOOTSTEP_VOLUME)),
    ));
}

fn fog_falloff(radius: f32) -> FogFalloff {
    FogFalloff::Linear {
        start: radius * 0.3,
        end: radius,
    }
}

pub fn set_cursor_grab(cursor: &mut CursorOptions, grabbed: bool) {
    if grabbed {
        cursor.grab_mode = CursorGrabMode::Locked;
        cursor.visible = false;
    } else {
        cursor.grab_mode = CursorGrabMode::None;
        cursor.visible = true;
    }
}

fn release_cursor(mut cursor: Query<&mut CursorOptions>) {
    let Ok(mut cursor) = cursor.single_mut() else {
        return;
    };
    set_cursor_grab(&mut cursor, false);
}

/// Move the player onto `target`, facing its heading with a level gaze.
pub fn teleport(transform: &mut Transform, look: &mut PlayerLook, target: &Transform) {
    let (yaw, _, _) = target.rotation.to_euler(EulerRot::YXZ);
    look.yaw = yaw;
    look.pitch = 0.0;
    transform.translation = target.translation;
    transform.rotation = look.rotation();
}

/// Stop the footstep loop right away, e.g. before a teleport.
pub fn stop_footsteps(footsteps: &mut Query<(&mut Footsteps, Option<&AudioSink>)>) {
    for (mut steps, sink) in footsteps.iter_mut() {
        steps.playing = false;
        if let Some(sink) = sink {
            sink.pause();
        }
    }
}

fn mouse_look(
    mut motion: MessageReader<MouseMotion>,
    mut query: Query<(&mut Transform, &mut PlayerLook, &PlayerControl), With<Player>>,
    cursor: Query<&CursorOptions>,
    settings: Res<GameSettings>,
) {
    let mut delta = Vec2::ZERO;
    for ev in motion.read() {
        delta += ev.delta;
    }

    let Ok(cursor) = cursor.single() else {
        return;
    };
    if cursor.grab_mode != CursorGrabMode::Locked || delta == Vec2::ZERO {
        return;
    }

    let Ok((mut transform, mut look, control)) = query.single_mut() else {
        return;
    };
    if control.look_locked {
        return;
    }

    let scale = settings.look_scale();
    look.yaw -= delta.x * scale;
    look.pitch = (look.pitch - delta.y * scale).clamp(-MAX_PITCH, MAX_PITCH);
    transform.rotation = look.rotation();
}

fn movement_input(keyboard: &ButtonInput<KeyCode>) -> Vec2 {
    let mut input = Vec2::ZERO;
    if keyboard.pressed(KeyCode::KeyW) {
        input.y += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        input.y -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        input.x += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        input.x -= 1.0;
    }
    input.normalize_or_zero()
}

/// Flat displacement for one frame of walking along the player's heading.
fn walk_delta(rotation: Quat, input: Vec2, speed: f32, dt: f32) -> Vec3 {
    let forward = rotation * Vec3::NEG_Z;
    let forward_xz = Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero();
    let right_xz = Vec3::new(-forward_xz.z, 0.0, forward_xz.x);
    (forward_xz * input.y + right_xz * input.x) * speed * dt
}

fn player_movement(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut query: Query<(&mut Transform, &PlayerControl), With<Player>>,
    time: Res<Time>,
) {
    let Ok((mut transform, control)) = query.single_mut() else {
        return;
    };
    if control.movement_locked {
        return;
    }
    let delta = walk_delta(
        transform.rotation,
        movement_input(&keyboard),
        WALK_SPEED,
        time.delta_secs(),
    );
    transform.translation += delta;
}

fn footsteps(
    keyboard: Res<ButtonInput<KeyCode>>,
    player: Query<&PlayerControl, With<Player>>,
    mut steps: Query<(&mut Footsteps, Option<&AudioSink>)>,
) {
    let Ok(control) = player.single() else {
        return;
    };
    let moving = !control.movement_locked
        && movement_input(&keyboard).length() > FOOTSTEP_THRESHOLD;

    for (mut footsteps, sink) in &mut steps {
        if moving == footsteps.playing {
            continue;
        }
        footsteps.playing = moving;
        if let Some(sink) = sink {
            if moving {
                sink.play();
            } else {
                sink.pause();
            }
        }
    }
}

fn silence_footsteps(mut steps: Query<(&mut Footsteps, Option<&AudioSink>)>) {
    stop_footsteps(&mut steps);
}

fn clamp_to_rooms(
    mut player: Query<(&mut Transform, &mut CurrentRoom), With<Player>>,
    rooms: Query<(Entity, &Room)>,
) {
    let Ok((mut transform, mut current)) = player.single_mut() else {
        return;
    };
    let flat = transform.translation.xz();
    let room = match rooms.iter().find(|(_, room)| room.contains(flat)) {
        Some((entity, room)) => {
            current.set_if_neq(CurrentRoom(Some(entity)));
            room
        }
        None => match current.0.and_then(|entity| rooms.get(entity).ok()) {
            Some((_, room)) => room,
            None => return,
        },
    };
    let clamped = room.clamp(flat);
    transform.translation.x = clamped.x;
    transform.translation.z = clamped.y;
}

fn flicker_lantern(mut lanterns: Query<(&HeldLantern, &mut PointLight, &Visibility)>) {
    let mut rng = rand::rng();
    for (lantern, mut light, visibility) in &mut lanterns {
        if *visibility == Visibility::Hidden {
            continue;
        }
        let jitter: f32 = rng.random_range(-LANTERN_FLICKER..=LANTERN_FLICKER);
        light.intensity = lantern.base_intensity * (1.0 + jitter);
    }
}

pub fn show_lantern(lanterns: &mut Query<&mut Visibility, With<HeldLantern>>, shown: bool) {
    for mut visibility in lanterns.iter_mut() {
        *visibility = if shown {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
}

fn hide_lantern(mut lanterns: Query<&mut Visibility, With<HeldLantern>>) {
    show_lantern(&mut lanterns, false);
}

fn apply_fog_radius(radius: Res<FogRadius>, mut fogs: Query<&mut DistanceFog, With<Player>>) {
    if !radius.is_changed() {
        return;
    }
    for mut fog in &mut fogs {
        fog.falloff = fog_falloff(radius.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use bevy::time::TimeUpdateStrategy;

    #[test]
    fn walking_forward_follows_yaw_on_the_floor() {
        let look = PlayerLook {
            yaw: std::f32::consts::FRAC_PI_2,
            pitch: -0.8,
        };
        let delta = walk_delta(look.rotation(), Vec2::Y, 6.0, 0.5);
        // Facing -X after a quarter turn left; pitch never lifts the player.
        assert!((delta - Vec3::new(-3.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn strafing_is_perpendicular_to_forward() {
        let delta = walk_delta(Quat::IDENTITY, Vec2::X, 1.0, 1.0);
        assert!((delta - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn teleport_takes_target_heading() {
        let mut transform = Transform::IDENTITY;
        let mut look = PlayerLook {
            yaw: 0.0,
            pitch: 0.4,
        };
        let target = Transform::from_xyz(3.0, EYE_HEIGHT, -2.0)
            .with_rotation(Quat::from_rotation_y(1.0));
        teleport(&mut transform, &mut look, &target);

        assert_eq!(transform.translation, target.translation);
        assert!((look.yaw - 1.0).abs() < 1e-5);
        assert_eq!(look.pitch, 0.0);
    }

    #[test]
    fn room_clamp_keeps_a_margin_from_walls() {
        let room = Room::new(Vec2::ZERO, Vec2::new(2.0, 3.0));
        assert!(room.contains(Vec2::new(1.9, -2.9)));
        assert!(!room.contains(Vec2::new(2.1, 0.0)));
        let clamped = room.clamp(Vec2::new(1.95, -2.99));
        assert!((clamped - Vec2::new(1.7, -2.7)).length() < 1e-5);
    }

    #[test]
    fn a_long_frame_cannot_carry_the_player_through_a_wall() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)))
            .init_resource::<ButtonInput<KeyCode>>()
            .add_systems(Update, (player_movement, clamp_to_rooms).chain());
        app.world_mut()
            .spawn(Room::new(Vec2::ZERO, Vec2::new(3.0, 3.0)));
        let player = app
            .world_mut()
            .spawn((
                Player,
                PlayerControl::default(),
                CurrentRoom::default(),
                Transform::from_xyz(0.0, EYE_HEIGHT, 0.0),
            ))
            .id();

        // Holding W at 0.6 units a frame against the north wall.
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::KeyW);
        for _ in 0..20 {
            app.update();
        }

        let z = app.world().get::<Transform>(player).unwrap().translation.z;
        assert!((z + 2.7).abs() < 1e-4, "player ended at z = {z}");
    }
}

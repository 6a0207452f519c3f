// The house: two copies of the same four rooms, doors between them, and everything to act on.
use std::f32::consts::{FRAC_PI_2, PI};

use bevy::prelude::*;

use crate::interactable::{
    BathroomSink, Door, DoorGraph, DoorId, DoorLink, DoorTargets, FinalDoor, Interactable,
    Lantern, Photo, WindowLatch,
};
use crate::interactor::HOUSE_SWITCH_OFFSET_Z;
use crate::look_away::LookAwayDisappear;
use crate::player::{EYE_HEIGHT, Room};
use crate::pursuer::Pursuer;
use crate::scenes::GameScene;
use crate::sound::{SoundBank, SoundPlayer};
use crate::text_trigger::TextTrigger;
use crate::triggers::{ObjectActivator, SoundTrigger, TriggerVolume};
use crate::volume::BoxExtent;

pub struct HousePlugin;

impl Plugin for HousePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DoorGraph>()
            .add_systems(OnEnter(GameScene::House), spawn_house)
            .add_systems(OnExit(GameScene::House), |mut graph: ResMut<DoorGraph>| {
                graph.clear();
            });
    }
}

/// Standing beside the bed in the first house.
pub const PLAYER_START: Vec3 = Vec3::new(1.0, EYE_HEIGHT, 1.2);
/// Facing the bedroom door.
pub const PLAYER_START_YAW: f32 = 0.0;

const WALL_HEIGHT: f32 = 3.0;
const WALL_THICKNESS: f32 = 0.1;
const DOOR_SIZE: Vec2 = Vec2::new(1.0, 2.0);
const WINDOW_SIZE: Vec2 = Vec2::new(1.0, 1.0);
const PANEL_DEPTH: f32 = 0.08;
const KNOCK_VOLUME: f32 = 0.9;
const PHOTO_VIEW_SECS: f32 = 4.0;

// Heading of the player after walking through a door, for each direction.
const FACING_NORTH: f32 = 0.0;
const FACING_SOUTH: f32 = PI;
const FACING_EAST: f32 = -FRAC_PI_2;
const FACING_WEST: f32 = FRAC_PI_2;

#[derive(Debug, Clone, Copy)]
struct RoomLayout {
    center: Vec2,
    half: Vec2,
}

const BEDROOM: RoomLayout = RoomLayout {
    center: Vec2::new(0.0, 0.0),
    half: Vec2::new(3.0, 3.0),
};
const HALLWAY: RoomLayout = RoomLayout {
    center: Vec2::new(0.0, -20.0),
    half: Vec2::new(1.5, 8.0),
};
const BATHROOM: RoomLayout = RoomLayout {
    center: Vec2::new(20.0, -16.0),
    half: Vec2::new(2.0, 2.0),
};
const STUDY: RoomLayout = RoomLayout {
    center: Vec2::new(-20.0, -22.0),
    half: Vec2::new(3.0, 3.0),
};
const ROOMS: [RoomLayout; 4] = [BEDROOM, HALLWAY, BATHROOM, STUDY];

// Door ids per copy of the house, indexed by `HouseCopy::index`.
const BEDROOM_DOOR: [DoorId; 2] = [DoorId("bedroom"), DoorId("bedroom_2")];
const HALL_TO_BEDROOM: [DoorId; 2] = [DoorId("hall_bedroom"), DoorId("hall_bedroom_2")];
const BATHROOM_DOOR: [DoorId; 2] = [DoorId("bathroom"), DoorId("bathroom_2")];
const BATHROOM_EXIT: [DoorId; 2] = [DoorId("bathroom_exit"), DoorId("bathroom_exit_2")];
const STUDY_DOOR: [DoorId; 2] = [DoorId("study"), DoorId("study_2")];
const STUDY_EXIT: [DoorId; 2] = [DoorId("study_exit"), DoorId("study_exit_2")];

/// The player wakes in the original and is moved into the double once every
/// window is locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HouseCopy {
    Original,
    Double,
}

impl HouseCopy {
    fn index(self) -> usize {
        match self {
            HouseCopy::Original => 0,
            HouseCopy::Double => 1,
        }
    }

    fn offset_z(self) -> f32 {
        match self {
            HouseCopy::Original => 0.0,
            HouseCopy::Double => HOUSE_SWITCH_OFFSET_Z,
        }
    }

    fn at(self, x: f32, y: f32, z: f32) -> Vec3 {
        Vec3::new(x, y, z + self.offset_z())
    }

    /// Where the player stands after walking through a door.
    fn arrival(self, x: f32, z: f32, yaw: f32) -> Transform {
        Transform::from_translation(self.at(x, EYE_HEIGHT, z))
            .with_rotation(Quat::from_rotation_y(yaw))
    }
}

/// Which way a wall panel faces.
#[derive(Debug, Clone, Copy)]
enum Wall {
    /// On a wall running along X, so it faces north or south.
    AlongX,
    /// On a wall running along Z, so it faces east or west.
    AlongZ,
}

impl Wall {
    fn panel(self, size: Vec2) -> Vec3 {
        match self {
            Wall::AlongX => Vec3::new(size.x, size.y, PANEL_DEPTH),
            Wall::AlongZ => Vec3::new(PANEL_DEPTH, size.y, size.x),
        }
    }
}

struct Palette {
    wall: Handle<StandardMaterial>,
    door: Handle<StandardMaterial>,
    window: Handle<StandardMaterial>,
    wood: Handle<StandardMaterial>,
    metal: Handle<StandardMaterial>,
    porcelain: Handle<StandardMaterial>,
    figure: Handle<StandardMaterial>,
}

impl Palette {
    fn new(materials: &mut Assets<StandardMaterial>) -> Self {
        let mut matte = |color: Color| {
            materials.add(StandardMaterial {
                base_color: color,
                perceptual_roughness: 0.95,
                ..default()
            })
        };
        Self {
            wall: matte(Color::srgb(0.36, 0.33, 0.29)),
            door: matte(Color::srgb(0.25, 0.16, 0.1)),
            window: matte(Color::srgb(0.2, 0.25, 0.32)),
            wood: matte(Color::srgb(0.32, 0.22, 0.14)),
            metal: matte(Color::srgb(0.3, 0.3, 0.32)),
            porcelain: matte(Color::srgb(0.85, 0.85, 0.82)),
            figure: matte(Color::srgb(0.02, 0.02, 0.02)),
        }
    }
}

/// Floor, ceiling and four walls enclosing a box that stands on `floor_center`.
pub fn spawn_room_shell(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    material: Handle<StandardMaterial>,
    floor_center: Vec3,
    size: Vec3,
    scene: GameScene,
) {
    let half = size / 2.0;
    let t = WALL_THICKNESS;
    let slab = Vec3::new(size.x, t, size.z);
    let side_x = Vec3::new(size.x, size.y, t);
    let side_z = Vec3::new(t, size.y, size.z);
    let pieces = [
        (slab, Vec3::new(0.0, -t / 2.0, 0.0)),
        (slab, Vec3::new(0.0, size.y + t / 2.0, 0.0)),
        (side_x, Vec3::new(0.0, half.y, -half.z - t / 2.0)),
        (side_x, Vec3::new(0.0, half.y, half.z + t / 2.0)),
        (side_z, Vec3::new(-half.x - t / 2.0, half.y, 0.0)),
        (side_z, Vec3::new(half.x + t / 2.0, half.y, 0.0)),
    ];
    for (dimensions, offset) in pieces {
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::from_size(dimensions))),
            MeshMaterial3d(material.clone()),
            Transform::from_translation(floor_center + offset),
            DespawnOnExit(scene),
        ));
    }
}

struct LevelBuilder<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    meshes: &'a mut Assets<Mesh>,
    palette: Palette,
}

impl LevelBuilder<'_, '_, '_> {
    fn room(&mut self, house: HouseCopy, layout: RoomLayout) {
        let center = Vec2::new(layout.center.x, layout.center.y + house.offset_z());
        spawn_room_shell(
            self.commands,
            self.meshes,
            self.palette.wall.clone(),
            Vec3::new(center.x, 0.0, center.y),
            Vec3::new(layout.half.x * 2.0, WALL_HEIGHT, layout.half.y * 2.0),
            GameScene::House,
        );
        self.commands.spawn((
            Room::new(center, layout.half),
            DespawnOnExit(GameScene::House),
        ));
    }

    /// A plain mesh box.
    fn prop(&mut self, size: Vec3, material: Handle<StandardMaterial>, at: Vec3) -> Entity {
        self.commands
            .spawn((
                Mesh3d(self.meshes.add(Cuboid::from_size(size))),
                MeshMaterial3d(material),
                Transform::from_translation(at),
                DespawnOnExit(GameScene::House),
            ))
            .id()
    }

    /// A mesh box the interactor can target.
    fn interactable(
        &mut self,
        size: Vec3,
        material: Handle<StandardMaterial>,
        at: Vec3,
        interactable: Interactable,
    ) -> Entity {
        let entity = self.prop(size, material, at);
        self.commands
            .entity(entity)
            .insert((interactable, BoxExtent(size / 2.0)));
        entity
    }

    fn door(&mut self, at: Vec3, wall: Wall, door: Door) -> Entity {
        let material = self.palette.door.clone();
        self.interactable(wall.panel(DOOR_SIZE), material, at, Interactable::Door(door))
    }

    fn window(&mut self, at: Vec3, wall: Wall) -> Entity {
        let material = self.palette.window.clone();
        self.interactable(
            wall.panel(WINDOW_SIZE),
            material,
            at,
            Interactable::Window(WindowLatch::default()),
        )
    }

    fn light(&mut self, at: Vec3, color: Color, intensity: f32, visibility: Visibility) -> Entity {
        self.commands
            .spawn((
                PointLight {
                    color,
                    intensity,
                    range: 10.0,
                    shadows_enabled: true,
                    ..default()
                },
                Transform::from_translation(at),
                visibility,
                DespawnOnExit(GameScene::House),
            ))
            .id()
    }

    /// Lines shown when something refuses the player.
    fn message(&mut self, lines: impl IntoIterator<Item = &'static str>) -> Entity {
        self.commands
            .spawn((
                TextTrigger::new(lines).on_request().repeatable(),
                DespawnOnExit(GameScene::House),
            ))
            .id()
    }

    /// Lines shown the first time the player walks into a box.
    fn narration(
        &mut self,
        at: Vec3,
        half: Vec3,
        lines: impl IntoIterator<Item = &'static str>,
    ) -> Entity {
        self.commands
            .spawn((
                TextTrigger::new(lines),
                TriggerVolume::default(),
                BoxExtent(half),
                Transform::from_translation(at),
                DespawnOnExit(GameScene::House),
            ))
            .id()
    }

    fn trigger_volume(&mut self, at: Vec3, half: Vec3) -> Entity {
        self.commands
            .spawn((
                TriggerVolume::default(),
                BoxExtent(half),
                Transform::from_translation(at),
                DespawnOnExit(GameScene::House),
            ))
            .id()
    }

    /// The doors joining the four rooms, with the refusal messages of the
    /// bedroom door and the two study doors.
    fn doors(
        &mut self,
        house: HouseCopy,
        bedroom_message: Option<Entity>,
        study_messages: [Option<Entity>; 2],
    ) {
        let i = house.index();
        let original = house == HouseCopy::Original;

        self.door(
            house.at(0.0, 1.0, -2.95),
            Wall::AlongX,
            Door {
                requires_lantern: original,
                locked_message: bedroom_message,
                ..Door::new(
                    BEDROOM_DOOR[i],
                    DoorTargets::to(house.arrival(0.0, -13.0, FACING_NORTH)),
                )
            },
        );
        // Once the windows are shut the hall only leads to the other bedroom.
        self.door(
            house.at(0.0, 1.0, -12.05),
            Wall::AlongX,
            Door::new(
                HALL_TO_BEDROOM[i],
                DoorTargets {
                    after_house_switch: original
                        .then(|| HouseCopy::Double.arrival(0.0, -2.0, FACING_SOUTH)),
                    ..DoorTargets::to(house.arrival(0.0, -2.0, FACING_SOUTH))
                },
            ),
        );
        self.door(
            house.at(1.45, 1.0, -16.0),
            Wall::AlongZ,
            Door::new(
                BATHROOM_DOOR[i],
                DoorTargets::to(house.arrival(18.8, -16.0, FACING_EAST)),
            ),
        );
        // With the crowbar in hand the bathroom lets out in front of the study.
        self.door(
            house.at(18.05, 1.0, -16.0),
            Wall::AlongZ,
            Door::new(
                BATHROOM_EXIT[i],
                DoorTargets {
                    after_crowbar: original
                        .then(|| house.arrival(-0.6, -22.0, FACING_WEST)),
                    ..DoorTargets::to(house.arrival(0.6, -16.0, FACING_WEST))
                },
            ),
        );

        // The study is jammed in the original and locks behind the player. The
        // double's study seals itself once the player walks back out.
        let [study_message, exit_message] = study_messages;
        self.door(
            house.at(-1.45, 1.0, -22.0),
            Wall::AlongZ,
            Door {
                jammed: original,
                one_time_use: original,
                locked_message: study_message,
                ..Door::new(
                    STUDY_DOOR[i],
                    DoorTargets::to(house.arrival(-18.2, -22.0, FACING_WEST)),
                )
            },
        );
        self.door(
            house.at(-17.05, 1.0, -22.0),
            Wall::AlongZ,
            Door {
                locked: original,
                one_time_use: !original,
                locked_message: exit_message,
                ..Door::new(
                    STUDY_EXIT[i],
                    DoorTargets::to(house.arrival(-0.6, -22.0, FACING_EAST)),
                )
            },
        );
    }

    fn original_house(&mut self) {
        let house = HouseCopy::Original;

        let lantern_message =
            self.message(["You need to find a light source before leaving..."]);
        let study_message =
            self.message(["It's jammed shut.", "Maybe something could pry it open."]);
        let exit_message = self.message(["It won't open from this side."]);
        self.doors(
            house,
            Some(lantern_message),
            [Some(study_message), Some(exit_message)],
        );

        // Bedroom: bed, lamp, lantern, photo and two windows.
        let wood = self.palette.wood.clone();
        self.prop(Vec3::new(1.4, 0.5, 2.2), wood.clone(), house.at(1.6, 0.25, 1.6));
        self.prop(Vec3::new(0.6, 0.6, 0.6), wood.clone(), house.at(-2.4, 0.3, 2.4));
        let lamp = self.light(
            house.at(-2.4, 1.2, 2.4),
            Color::srgb(1.0, 0.8, 0.55),
            40_000.0,
            Visibility::Inherited,
        );
        let hall_light = self.light(
            house.at(0.0, 2.7, -20.0),
            Color::srgb(0.55, 0.6, 0.8),
            30_000.0,
            Visibility::Hidden,
        );
        let metal = self.palette.metal.clone();
        self.interactable(
            Vec3::new(0.25, 0.4, 0.25),
            metal.clone(),
            house.at(-2.4, 0.8, 2.4),
            Interactable::Lantern(Lantern {
                light_to_enable: Some(hall_light),
                light_to_disable: Some(lamp),
            }),
        );
        self.interactable(
            Vec3::new(0.05, 0.4, 0.5),
            wood.clone(),
            house.at(2.95, 1.5, -0.5),
            Interactable::Photo(Photo {
                caption: "Mum, Dad and me. The summer before the lake.".to_string(),
                view_seconds: PHOTO_VIEW_SECS,
            }),
        );
        self.window(house.at(-2.95, 1.5, 0.0), Wall::AlongZ);
        self.window(house.at(0.0, 1.5, 2.95), Wall::AlongX);

        // Hallway.
        self.window(house.at(-1.45, 1.5, -14.0), Wall::AlongZ);
        self.narration(
            house.at(0.0, 1.5, -14.0),
            Vec3::splat(1.5),
            [
                "The hallway is colder than I remember.",
                "Every window in this house is open.",
            ],
        );

        // Bathroom: sink, crowbar and a window.
        let sink_message = self.message(["Did someone just knock?"]);
        let porcelain = self.palette.porcelain.clone();
        self.interactable(
            Vec3::new(0.5, 0.2, 0.6),
            porcelain,
            house.at(21.7, 0.9, -16.0),
            Interactable::BathroomSink(BathroomSink {
                message: Some(sink_message),
                ..default()
            }),
        );
        self.interactable(
            Vec3::new(0.8, 0.08, 0.08),
            metal,
            house.at(20.0, 0.05, -14.4),
            Interactable::Crowbar,
        );
        self.window(house.at(20.0, 1.5, -17.95), Wall::AlongX);

        // Study.
        self.prop(Vec3::new(1.6, 0.8, 0.8), wood, house.at(-22.0, 0.4, -24.2));
        self.window(house.at(-22.95, 1.5, -22.0), Wall::AlongZ);
    }

    fn double_house(&mut self, bank: &SoundBank) {
        let house = HouseCopy::Double;
        self.doors(house, None, [None, None]);

        self.narration(
            house.at(0.0, 1.5, 0.0),
            Vec3::new(3.0, 1.5, 3.0),
            ["This isn't my room.", "It only looks like it."],
        );

        // The revolver waits on the nightstand.
        let wood = self.palette.wood.clone();
        let metal = self.palette.metal.clone();
        self.prop(Vec3::new(1.4, 0.5, 2.2), wood.clone(), house.at(1.6, 0.25, 1.6));
        self.prop(Vec3::new(0.6, 0.6, 0.6), wood, house.at(-2.4, 0.3, 2.4));
        self.interactable(
            Vec3::new(0.3, 0.12, 0.15),
            metal,
            house.at(-2.4, 0.66, 2.4),
            Interactable::Gun,
        );

        // The final door at the end of the hall and what waits behind it.
        let final_message = self.message(["Not without something to defend yourself."]);
        let door_material = self.palette.door.clone();
        self.interactable(
            Wall::AlongX.panel(DOOR_SIZE),
            door_material,
            house.at(0.0, 1.0, -27.95),
            Interactable::FinalDoor(FinalDoor {
                refusal_message: Some(final_message),
                ..default()
            }),
        );
        self.commands.spawn((
            Pursuer::default(),
            Mesh3d(self.meshes.add(Capsule3d::new(0.35, 1.2))),
            MeshMaterial3d(self.palette.figure.clone()),
            Transform::from_translation(house.at(0.0, 1.0, -30.0)),
            Visibility::Hidden,
            DespawnOnExit(GameScene::House),
        ));

        // Knocking starts as the player steps into the hall.
        let mut knock = SoundPlayer::new(bank.knock.clone(), KNOCK_VOLUME);
        knock.fade_in = false;
        let knock = self
            .commands
            .spawn((knock, DespawnOnExit(GameScene::House)))
            .id();
        let mut sound_trigger = SoundTrigger::new(vec![knock]);
        sound_trigger.trigger_once = true;
        let knock_trigger = self.trigger_volume(house.at(0.0, 1.5, -13.5), Vec3::splat(1.5));
        self.commands.entity(knock_trigger).insert(sound_trigger);

        // A figure shows up halfway down the hall and is gone once the player looks away.
        let figure_size = Vec3::new(0.5, 1.8, 0.5);
        let figure_at = house.at(0.9, 0.9, -24.0);
        let figure_material = self.palette.figure.clone();
        let figure = self.prop(figure_size, figure_material, figure_at);
        self.commands
            .entity(figure)
            .insert((BoxExtent(figure_size / 2.0), Visibility::Hidden));
        let activator = self.trigger_volume(house.at(0.0, 1.5, -18.0), Vec3::new(1.5, 1.5, 0.5));
        self.commands
            .entity(activator)
            .insert(ObjectActivator::new(vec![figure]));
        self.commands.spawn((
            LookAwayDisappear::new(vec![figure]),
            Transform::from_translation(figure_at),
            DespawnOnExit(GameScene::House),
        ));
    }
}

fn spawn_house(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut graph: ResMut<DoorGraph>,
    bank: Res<SoundBank>,
) {
    let mut level = LevelBuilder {
        commands: &mut commands,
        meshes: &mut meshes,
        palette: Palette::new(&mut materials),
    };
    for house in [HouseCopy::Original, HouseCopy::Double] {
        for layout in ROOMS {
            level.room(house, layout);
        }
    }
    level.original_house();
    level.double_house(&bank);

    graph.clear();
    let (original, double) = (HouseCopy::Original.index(), HouseCopy::Double.index());
    graph
        .link(
            STUDY_DOOR[original],
            DoorLink::UnlockOnLock(STUDY_EXIT[original]),
        )
        .link(STUDY_EXIT[double], DoorLink::LockOnUse(STUDY_DOOR[double]));
    info!("House spawned");
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::interactable::LockChange;
    use crate::scenes::GameFlags;

    fn spawned_house() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<StandardMaterial>>()
            .init_resource::<DoorGraph>()
            .init_resource::<SoundBank>()
            .add_systems(Update, spawn_house);
        app.update();
        app
    }

    #[test]
    fn house_has_five_windows_and_one_final_door() {
        let mut app = spawned_house();
        let interactables: Vec<Interactable> = app
            .world_mut()
            .query::<&Interactable>()
            .iter(app.world())
            .cloned()
            .collect();

        let windows = interactables
            .iter()
            .filter(|i| matches!(i, Interactable::Window(_)))
            .count();
        let final_doors = interactables
            .iter()
            .filter(|i| matches!(i, Interactable::FinalDoor(_)))
            .count();
        assert_eq!(windows, 5);
        assert_eq!(final_doors, 1);

        let (pursuer, visibility) = app
            .world_mut()
            .query::<(&Pursuer, &Visibility)>()
            .single(app.world())
            .unwrap();
        assert!(!pursuer.is_active());
        assert_eq!(*visibility, Visibility::Hidden);
    }

    #[test]
    fn study_unlocks_its_exit_when_it_locks_behind_the_player() {
        let app = spawned_house();
        let graph = app.world().resource::<DoorGraph>();
        assert_eq!(
            graph.changes_after_use(STUDY_DOOR[0]),
            vec![LockChange::Unlock(STUDY_EXIT[0])]
        );
    }

    #[test]
    fn double_study_seals_once_left() {
        let mut app = spawned_house();
        let graph = app.world().resource::<DoorGraph>();
        assert_eq!(
            graph.changes_after_use(STUDY_EXIT[1]),
            vec![LockChange::Lock(STUDY_DOOR[1])]
        );

        let exit = door_by_id(&mut app, STUDY_EXIT[1]);
        assert!(exit.one_time_use);
        assert!(!door_by_id(&mut app, STUDY_EXIT[0]).one_time_use);
    }

    #[test]
    fn later_beats_reroute_doors() {
        let mut app = spawned_house();
        let mut flags = GameFlags::default();

        let bathroom_exit = door_by_id(&mut app, BATHROOM_EXIT[0]);
        let before = bathroom_exit.resolve_target(&flags).translation;
        flags.has_crowbar = true;
        let after = bathroom_exit.resolve_target(&flags).translation;
        assert!(HALLWAY_ROOM.contains(before.xz()) && HALLWAY_ROOM.contains(after.xz()));
        assert!(after.z < before.z, "the crowbar should lead towards the study");

        let hall = door_by_id(&mut app, HALL_TO_BEDROOM[0]);
        assert!(hall.resolve_target(&flags).translation.z > -10.0);
        flags.all_windows_locked = true;
        let switched = hall.resolve_target(&flags).translation;
        assert!((switched.z - (-2.0 + HOUSE_SWITCH_OFFSET_Z)).abs() < 1e-4);
    }

    const HALLWAY_ROOM: Room = Room {
        min: Vec2::new(-1.5, -28.0),
        max: Vec2::new(1.5, -12.0),
    };

    fn door_by_id(app: &mut App, id: DoorId) -> Door {
        app.world_mut()
            .query::<&Interactable>()
            .iter(app.world())
            .find_map(|interactable| match interactable {
                Interactable::Door(door) if door.id == id => Some(door.clone()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn every_door_lands_inside_a_room() {
        let mut app = spawned_house();
        let rooms: Vec<Room> = app
            .world_mut()
            .query::<&Room>()
            .iter(app.world())
            .copied()
            .collect();
        assert_eq!(rooms.len(), 8);

        let mut doors = 0;
        for interactable in app.world_mut().query::<&Interactable>().iter(app.world()) {
            let Interactable::Door(door) = interactable else {
                continue;
            };
            doors += 1;
            let targets = [
                Some(door.targets.default),
                door.targets.after_crowbar,
                door.targets.after_house_switch,
            ];
            for target in targets.into_iter().flatten() {
                assert!(
                    rooms.iter().any(|room| room.contains(target.translation.xz())),
                    "door {} sends the player outside the house",
                    door.id.0
                );
            }
        }
        assert_eq!(doors, 12);

        // The house switch lands in the double.
        let start = PLAYER_START + Vec3::Z * HOUSE_SWITCH_OFFSET_Z;
        assert!(rooms.iter().any(|room| room.contains(start.xz())));
    }
}

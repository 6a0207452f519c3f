// Player interaction: look-ray focus, the E key verbs, the gun, and the HUD icons.
use bevy::prelude::*;
use bevy::ui::FocusPolicy;

use crate::fader::fade_and_teleport;
use crate::interactable::{DoorGraph, Interactable, LockChange, Outcome};
use crate::pause::gameplay_running;
use crate::player::{Footsteps, HeldLantern, Player, PlayerControl, show_lantern, stop_footsteps};
use crate::pursuer::Pursuer;
use crate::scenes::{GameFlags, GameScene};
use crate::sequences::StartSequence;
use crate::sound::{SoundBank, play_once};
use crate::text_trigger::StartTextTrigger;
use crate::volume::BoxExtent;

pub struct InteractorPlugin;

impl Plugin for InteractorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Focus>()
            .add_systems(OnEnter(GameScene::House), spawn_hud)
            .add_systems(
                Update,
                (
                    tally_windows,
                    tick_cooldown,
                    focus_interactable,
                    handle_interaction,
                    shoot_gun,
                    sync_inventory,
                )
                    .chain()
                    .run_if(in_state(GameScene::House).and(gameplay_running)),
            )
            .add_systems(OnExit(GameScene::House), reset_interactor);
    }
}

const DOOR_OPEN_VOLUME: f32 = 0.8;
const PICKUP_VOLUME: f32 = 0.6;
const GUNSHOT_VOLUME: f32 = 1.0;
const MISS_COOLDOWN_SECS: f32 = 0.6;
const GUN_RANGE: f32 = 30.0;
const GUN_CONE_DEGREES: f32 = 12.0;
/// Z shift from the first house to its double once every window is locked.
pub const HOUSE_SWITCH_OFFSET_Z: f32 = -66.75 - 41.0;

#[derive(Debug, Clone)]
pub enum InteractorState {
    Idle,
    Cooldown(Timer),
    /// A door fade or a sequence owns the player.
    Busy,
}

#[derive(Component, Debug)]
pub struct Interactor {
    pub state: InteractorState,
    pub range: f32,
    /// The window teleport has already happened.
    pub house_switched: bool,
}

impl Default for Interactor {
    fn default() -> Self {
        Self {
            state: InteractorState::Idle,
            range: 5.0,
            house_switched: false,
        }
    }
}

impl Interactor {
    pub fn is_idle(&self) -> bool {
        matches!(self.state, InteractorState::Idle)
    }

    pub fn busy(&mut self) {
        self.state = InteractorState::Busy;
    }

    pub fn cooldown(&mut self, secs: f32) {
        self.state = InteractorState::Cooldown(Timer::from_seconds(secs, TimerMode::Once));
    }

    pub fn release(&mut self) {
        self.state = InteractorState::Idle;
    }
}

/// Interactable under the crosshair this frame.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Focus(pub Option<Entity>);

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HudIcon {
    Interact,
    Lock,
    Lantern,
    Crowbar,
    Gun,
}

fn spawn_hud(mut commands: Commands) {
    // Crosshair prompts.
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            FocusPolicy::Pass,
            DespawnOnExit(GameScene::House),
        ))
        .with_children(|parent| {
            spawn_icon(parent, HudIcon::Interact, "[E]");
            spawn_icon(parent, HudIcon::Lock, "Locked");
        });

    // Inventory row.
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(24.0),
                bottom: Val::Px(24.0),
                column_gap: Val::Px(16.0),
                ..default()
            },
            FocusPolicy::Pass,
            DespawnOnExit(GameScene::House),
        ))
        .with_children(|parent| {
            spawn_icon(parent, HudIcon::Lantern, "Lantern");
            spawn_icon(parent, HudIcon::Crowbar, "Crowbar");
            spawn_icon(parent, HudIcon::Gun, "Revolver");
        });
}

fn spawn_icon(parent: &mut ChildSpawnerCommands, icon: HudIcon, label: &str) {
    parent.spawn((
        icon,
        Text::new(label),
        TextFont {
            font_size: 18.0,
            ..default()
        },
        TextColor(Color::srgba(0.9, 0.9, 0.85, 0.8)),
        FocusPolicy::Pass,
        Visibility::Hidden,
    ));
}

fn tally_windows(mut flags: ResMut<GameFlags>, interactables: Query<&Interactable>) {
    let (total, locked) = interactables
        .iter()
        .filter_map(|interactable| match interactable {
            Interactable::Window(window) => Some(window.locked),
            _ => None,
        })
        .fold((0, 0), |(total, locked), is_locked| {
            (total + 1, locked + u32::from(is_locked))
        });
    if flags.total_windows != total || flags.locked_windows != locked {
        flags.total_windows = total;
        flags.locked_windows = locked;
    }
}

fn tick_cooldown(time: Res<Time>, mut player: Query<&mut Interactor, With<Player>>) {
    let Ok(mut interactor) = player.single_mut() else {
        return;
    };
    let done = match &mut interactor.state {
        InteractorState::Cooldown(timer) => timer.tick(time.delta()).just_finished(),
        _ => false,
    };
    if done {
        interactor.release();
    }
}

/// Nearest box hit by the ray within `range`.
pub fn pick_target<'a>(
    origin: Vec3,
    dir: Vec3,
    range: f32,
    candidates: impl IntoIterator<Item = (Entity, &'a BoxExtent, Vec3)>,
) -> Option<Entity> {
    candidates
        .into_iter()
        .filter_map(|(entity, extent, center)| {
            extent
                .ray_distance(center, origin, dir)
                .filter(|distance| *distance <= range)
                .map(|distance| (entity, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(entity, _)| entity)
}

fn focus_interactable(
    player: Query<(&Transform, &Interactor), With<Player>>,
    targets: Query<(Entity, &Interactable, &BoxExtent, &Transform), Without<Player>>,
    mut focus: ResMut<Focus>,
    mut icons: Query<(&HudIcon, &mut Visibility)>,
) {
    let Ok((eye, interactor)) = player.single() else {
        return;
    };

    let target = if interactor.is_idle() {
        pick_target(
            eye.translation,
            eye.forward().as_vec3(),
            interactor.range,
            targets
                .iter()
                .map(|(entity, _, extent, transform)| (entity, extent, transform.translation)),
        )
    } else {
        None
    };
    if focus.0 != target {
        focus.0 = target;
    }

    let locked = target
        .and_then(|entity| targets.get(entity).ok())
        .is_some_and(|(_, interactable, _, _)| interactable.shows_lock());
    for (icon, mut visibility) in &mut icons {
        let shown = match icon {
            HudIcon::Interact => target.is_some() && !locked,
            HudIcon::Lock => locked,
            _ => continue,
        };
        visibility.set_if_neq(if shown {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        });
    }
}

fn handle_interaction(
    mut commands: Commands,
    keyboard: Res<ButtonInput<KeyCode>>,
    focus: Res<Focus>,
    mut flags: ResMut<GameFlags>,
    graph: Res<DoorGraph>,
    bank: Res<SoundBank>,
    mut player: Query<(&mut Interactor, &mut PlayerControl, &mut Transform), With<Player>>,
    mut interactables: Query<&mut Interactable>,
    mut footsteps: Query<(&mut Footsteps, Option<&AudioSink>)>,
    mut text_triggers: MessageWriter<StartTextTrigger>,
    mut sequences: MessageWriter<StartSequence>,
) {
    if !keyboard.just_pressed(KeyCode::KeyE) || flags.ending_triggered() {
        return;
    }
    let Some(target) = focus.0 else {
        return;
    };
    let Ok((mut interactor, mut control, mut transform)) = player.single_mut() else {
        return;
    };
    if !interactor.is_idle() {
        return;
    }
    let Ok(mut interactable) = interactables.get_mut(target) else {
        return;
    };

    let name = interactable.name();
    let refusal_message = interactable.refusal_message();
    let outcome = match interactable.interact(&mut flags) {
        Ok(outcome) => outcome,
        Err(refusal) => {
            info!("{name} refused: {refusal}");
            if let Some(message) = refusal_message {
                text_triggers.write(StartTextTrigger(message));
            }
            return;
        }
    };

    match outcome {
        Outcome::Inspected => {}
        Outcome::DoorOpened(opened) => {
            play_once(&mut commands, &bank.door_open, DOOR_OPEN_VOLUME);
            stop_footsteps(&mut footsteps);
            if opened.locked_self {
                apply_lock_changes(&graph.changes_after_use(opened.id), &mut interactables);
            }
            interactor.busy();
            control.lock();
            fade_and_teleport(&mut commands, opened.target);
            info!("Door {} used", opened.id.0);
        }
        Outcome::LanternTaken(lantern) => {
            play_once(&mut commands, &bank.pickup, PICKUP_VOLUME);
            set_visible(&mut commands, lantern.light_to_enable, Visibility::Inherited);
            set_visible(&mut commands, lantern.light_to_disable, Visibility::Hidden);
            commands.entity(target).despawn();
        }
        Outcome::WindowLocked(locked) => {
            play_once(&mut commands, &bank.window_lock, locked.volume);
            if locked.completed_set && !interactor.house_switched {
                interactor.house_switched = true;
                stop_footsteps(&mut footsteps);
                transform.translation.z += HOUSE_SWITCH_OFFSET_Z;
                info!("House switched, player moved to {}", transform.translation);
            }
        }
        Outcome::PhotoViewed(photo) => {
            interactor.busy();
            sequences.write(StartSequence::Photo(photo));
        }
        Outcome::SinkUsed { message } => {
            interactor.busy();
            sequences.write(StartSequence::Sink { message });
        }
        Outcome::FinalDoorOpened => {
            interactor.busy();
            sequences.write(StartSequence::FinalDoor { door: target });
        }
        Outcome::CrowbarTaken | Outcome::GunTaken => {
            play_once(&mut commands, &bank.pickup, PICKUP_VOLUME);
            commands.entity(target).despawn();
        }
    }
}

fn apply_lock_changes(changes: &[LockChange], interactables: &mut Query<&mut Interactable>) {
    for change in changes {
        let (id, lock) = match *change {
            LockChange::Lock(id) => (id, true),
            LockChange::Unlock(id) => (id, false),
        };
        let mut found = false;
        for mut interactable in interactables.iter_mut() {
            if !matches!(&*interactable, Interactable::Door(door) if door.id == id) {
                continue;
            }
            found = true;
            if lock {
                interactable.lock_door();
            } else {
                interactable.unlock_door();
            }
        }
        if !found {
            warn!("Door link points at missing door {}", id.0);
        }
    }
}

fn set_visible(commands: &mut Commands, entity: Option<Entity>, visibility: Visibility) {
    let Some(entity) = entity else {
        return;
    };
    if let Ok(mut entity) = commands.get_entity(entity) {
        entity.insert(visibility);
    }
}

/// Whether a shot from `eye` along `forward` hits something standing at `target`.
/// Height is ignored so a close target is not missed by aiming at its feet.
pub fn gun_hits(eye: Vec3, forward: Vec3, target: Vec3) -> bool {
    let to_target = target.xz() - eye.xz();
    let aim = forward.xz();
    if to_target.length() > GUN_RANGE || aim == Vec2::ZERO {
        return false;
    }
    if to_target == Vec2::ZERO {
        return true;
    }
    aim.angle_to(to_target).abs() <= GUN_CONE_DEGREES.to_radians()
}

fn shoot_gun(
    mut commands: Commands,
    mouse: Res<ButtonInput<MouseButton>>,
    flags: Res<GameFlags>,
    bank: Res<SoundBank>,
    mut player: Query<(&Transform, &mut Interactor), With<Player>>,
    pursuers: Query<(Entity, &Pursuer, &Transform), Without<Player>>,
    mut sequences: MessageWriter<StartSequence>,
) {
    if !mouse.just_pressed(MouseButton::Left) || !flags.has_gun || flags.ending_triggered() {
        return;
    }
    let Ok((eye, mut interactor)) = player.single_mut() else {
        return;
    };
    if !interactor.is_idle() {
        return;
    }

    let forward = eye.forward().as_vec3();
    let hit = pursuers.iter().find(|(_, pursuer, transform)| {
        pursuer.is_active() && gun_hits(eye.translation, forward, transform.translation)
    });
    match hit {
        Some((pursuer, _, _)) => {
            interactor.busy();
            sequences.write(StartSequence::Gunshot { pursuer });
        }
        None => {
            play_once(&mut commands, &bank.gunshot, GUNSHOT_VOLUME);
            interactor.cooldown(MISS_COOLDOWN_SECS);
            info!("Shot missed");
        }
    }
}

fn sync_inventory(
    flags: Res<GameFlags>,
    mut icons: Query<(&HudIcon, &mut Visibility), Without<HeldLantern>>,
    mut lanterns: Query<&mut Visibility, With<HeldLantern>>,
) {
    if !flags.is_changed() {
        return;
    }
    for (icon, mut visibility) in &mut icons {
        let held = match icon {
            HudIcon::Lantern => flags.has_lantern,
            HudIcon::Crowbar => flags.has_crowbar,
            HudIcon::Gun => flags.has_gun,
            _ => continue,
        };
        *visibility = if held {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
    show_lantern(&mut lanterns, flags.has_lantern);
}

fn reset_interactor(mut focus: ResMut<Focus>, mut player: Query<&mut Interactor, With<Player>>) {
    focus.0 = None;
    if let Ok(mut interactor) = player.single_mut() {
        *interactor = Interactor::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use bevy::time::TimeUpdateStrategy;

    use crate::interactable::{BathroomSink, Door, DoorId, DoorLink, DoorTargets, WindowLatch};
    use crate::player::PlayerLook;

    const FRONT: DoorId = DoorId("front");
    const BACK: DoorId = DoorId("back");

    #[test]
    fn nearest_box_in_range_wins() {
        let mut world = World::new();
        let near = world.spawn_empty().id();
        let far = world.spawn_empty().id();
        let extent = BoxExtent::cube(0.5);
        let candidates = [
            (far, &extent, Vec3::new(0.0, 0.0, -4.0)),
            (near, &extent, Vec3::new(0.0, 0.0, -2.0)),
        ];

        assert_eq!(pick_target(Vec3::ZERO, Vec3::NEG_Z, 5.0, candidates), Some(near));
        assert_eq!(pick_target(Vec3::ZERO, Vec3::NEG_Z, 1.0, candidates), None);
        assert_eq!(pick_target(Vec3::ZERO, Vec3::Z, 5.0, candidates), None);
    }

    #[test]
    fn gun_needs_a_narrow_cone_and_range() {
        let eye = Vec3::new(0.0, 1.6, 0.0);
        assert!(gun_hits(eye, Vec3::NEG_Z, Vec3::new(0.0, 1.0, -10.0)));
        assert!(gun_hits(eye, Vec3::NEG_Z, Vec3::new(1.0, 1.0, -10.0)));
        assert!(!gun_hits(eye, Vec3::NEG_Z, Vec3::new(5.0, 1.0, -10.0)));
        assert!(!gun_hits(eye, Vec3::NEG_Z, Vec3::new(0.0, 1.0, -31.0)));
        assert!(!gun_hits(eye, Vec3::NEG_Z, Vec3::new(0.0, 1.0, 10.0)));
    }

    #[derive(Resource, Default)]
    struct SentMessages(Vec<StartTextTrigger>);

    fn collect_messages(
        mut reader: MessageReader<StartTextTrigger>,
        mut sent: ResMut<SentMessages>,
    ) {
        sent.0.extend(reader.read().copied());
    }

    fn interaction_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<GameFlags>()
            .init_resource::<DoorGraph>()
            .init_resource::<SoundBank>()
            .init_resource::<Focus>()
            .init_resource::<ButtonInput<KeyCode>>()
            .add_message::<StartTextTrigger>()
            .add_message::<StartSequence>()
            .init_resource::<SentMessages>()
            .add_systems(
                Update,
                (
                    tally_windows,
                    focus_interactable,
                    handle_interaction,
                    collect_messages,
                )
                    .chain(),
            );
        app.world_mut().spawn((
            Player,
            PlayerLook {
                yaw: 0.0,
                pitch: 0.0,
            },
            PlayerControl::default(),
            Interactor::default(),
            Transform::from_xyz(0.0, 1.6, 0.0),
        ));
        app
    }

    fn press_e(app: &mut App) {
        let mut keyboard = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
        keyboard.release(KeyCode::KeyE);
        keyboard.clear();
        keyboard.press(KeyCode::KeyE);
        app.update();
    }

    fn door_in_front(app: &mut App, door: Door) -> Entity {
        app.world_mut()
            .spawn((
                Interactable::Door(door),
                BoxExtent(Vec3::new(0.5, 1.0, 0.1)),
                Transform::from_xyz(0.0, 1.6, -2.0),
            ))
            .id()
    }

    #[test]
    fn one_time_door_locks_and_unlocks_its_partner() {
        let mut app = interaction_app();
        app.world_mut()
            .resource_mut::<DoorGraph>()
            .link(FRONT, DoorLink::UnlockOnLock(BACK));

        let front = door_in_front(
            &mut app,
            Door {
                one_time_use: true,
                ..Door::new(FRONT, DoorTargets::to(Transform::from_xyz(0.0, 1.6, 20.0)))
            },
        );
        let back = app
            .world_mut()
            .spawn((
                Interactable::Door(Door {
                    locked: true,
                    ..Door::new(BACK, DoorTargets::to(Transform::IDENTITY))
                }),
                BoxExtent::cube(0.5),
                Transform::from_xyz(0.0, 1.6, 40.0),
            ))
            .id();

        press_e(&mut app);

        let world = app.world();
        assert!(world.get::<Interactable>(front).unwrap().shows_lock());
        assert!(!world.get::<Interactable>(back).unwrap().shows_lock());

        let mut player = app.world_mut().query::<(&Interactor, &PlayerControl)>();
        let (interactor, control) = player.single(app.world()).unwrap();
        assert!(!interactor.is_idle());
        assert!(control.movement_locked && control.look_locked);
    }

    #[test]
    fn locked_door_starts_its_message() {
        let mut app = interaction_app();
        let message = app.world_mut().spawn_empty().id();
        door_in_front(
            &mut app,
            Door {
                locked: true,
                locked_message: Some(message),
                ..Door::new(FRONT, DoorTargets::to(Transform::IDENTITY))
            },
        );

        press_e(&mut app);

        assert_eq!(
            app.world().resource::<SentMessages>().0,
            vec![StartTextTrigger(message)]
        );

        let mut player = app.world_mut().query::<&Interactor>();
        assert!(player.single(app.world()).unwrap().is_idle());
    }

    #[test]
    fn locking_the_last_window_switches_house_once() {
        let mut app = interaction_app();
        app.world_mut().spawn((
            Interactable::Window(WindowLatch::default()),
            BoxExtent::cube(0.5),
            Transform::from_xyz(0.0, 1.6, -2.0),
        ));

        press_e(&mut app);

        assert!(app.world().resource::<GameFlags>().all_windows_locked);
        let mut player = app.world_mut().query::<(&Transform, &Interactor)>();
        let (transform, interactor) = player.single(app.world()).unwrap();
        assert!((transform.translation.z - HOUSE_SWITCH_OFFSET_Z).abs() < 1e-4);
        assert!(interactor.house_switched);
    }

    #[test]
    fn used_sink_stays_quiet() {
        let mut app = interaction_app();
        let message = app.world_mut().spawn_empty().id();
        app.world_mut().spawn((
            Interactable::BathroomSink(BathroomSink {
                used: true,
                message: Some(message),
                ..default()
            }),
            BoxExtent::cube(0.5),
            Transform::from_xyz(0.0, 1.6, -2.0),
        ));

        press_e(&mut app);

        assert!(app.world().resource::<SentMessages>().0.is_empty());
        let mut player = app.world_mut().query::<&Interactor>();
        assert!(player.single(app.world()).unwrap().is_idle());
    }

    #[test]
    fn doors_ignore_the_player_once_an_ending_started() {
        let mut app = interaction_app();
        app.world_mut()
            .resource_mut::<GameFlags>()
            .caught_ending_triggered = true;
        door_in_front(
            &mut app,
            Door::new(FRONT, DoorTargets::to(Transform::from_xyz(0.0, 1.6, 20.0))),
        );

        press_e(&mut app);

        let mut player = app.world_mut().query::<(&Interactor, &PlayerControl)>();
        let (interactor, control) = player.single(app.world()).unwrap();
        assert!(interactor.is_idle());
        assert!(!control.movement_locked);
    }

    #[derive(Resource, Default)]
    struct SentSequences(Vec<StartSequence>);

    fn collect_sequences(
        mut reader: MessageReader<StartSequence>,
        mut sent: ResMut<SentSequences>,
    ) {
        sent.0.extend(reader.read().cloned());
    }

    fn gun_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)))
            .init_resource::<GameFlags>()
            .init_resource::<SoundBank>()
            .init_resource::<ButtonInput<MouseButton>>()
            .add_message::<StartSequence>()
            .init_resource::<SentSequences>()
            .add_systems(Update, (tick_cooldown, shoot_gun, collect_sequences).chain());
        app.world_mut().spawn((
            Player,
            Interactor::default(),
            Transform::from_xyz(0.0, 1.6, 0.0),
        ));
        app
    }

    fn click(app: &mut App) {
        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .press(MouseButton::Left);
        app.update();
        let mut mouse = app.world_mut().resource_mut::<ButtonInput<MouseButton>>();
        mouse.release(MouseButton::Left);
        mouse.clear();
    }

    fn interactor_state(app: &mut App) -> InteractorState {
        let mut player = app.world_mut().query_filtered::<&Interactor, With<Player>>();
        player.single(app.world()).unwrap().state.clone()
    }

    #[test]
    fn missed_shot_cools_down_then_returns_to_idle() {
        let mut app = gun_app();
        app.world_mut().resource_mut::<GameFlags>().has_gun = true;

        click(&mut app);
        assert!(matches!(
            interactor_state(&mut app),
            InteractorState::Cooldown(_)
        ));

        for _ in 0..5 {
            app.update();
        }
        assert!(!matches!(interactor_state(&mut app), InteractorState::Idle));

        for _ in 0..2 {
            app.update();
        }
        assert!(matches!(interactor_state(&mut app), InteractorState::Idle));
        assert!(app.world().resource::<SentSequences>().0.is_empty());
    }

    #[test]
    fn gun_is_silent_without_it_or_after_an_ending() {
        let mut app = gun_app();
        click(&mut app);
        assert!(matches!(interactor_state(&mut app), InteractorState::Idle));

        {
            let mut flags = app.world_mut().resource_mut::<GameFlags>();
            flags.has_gun = true;
            flags.caught_ending_triggered = true;
        }
        click(&mut app);
        assert!(matches!(interactor_state(&mut app), InteractorState::Idle));
        assert!(app.world().resource::<SentSequences>().0.is_empty());
    }

    #[test]
    fn hitting_the_pursuer_starts_the_shot_ending() {
        let mut app = gun_app();
        app.world_mut().resource_mut::<GameFlags>().has_gun = true;
        let mut pursuer = Pursuer::default();
        pursuer.activate();
        let pursuer = app
            .world_mut()
            .spawn((pursuer, Transform::from_xyz(0.5, 1.0, -8.0)))
            .id();

        click(&mut app);

        let sent = &app.world().resource::<SentSequences>().0;
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0], StartSequence::Gunshot { pursuer: p } if p == pursuer));
        assert!(!matches!(interactor_state(&mut app), InteractorState::Idle));
    }
}

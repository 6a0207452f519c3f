// Trigger volumes the player can walk into, and the helpers driven by them.
use bevy::prelude::*;

use crate::player::Player;
use crate::scenes::GameScene;
use crate::sound::SoundPlayer;
use crate::volume::BoxExtent;

pub struct TriggersPlugin;

impl Plugin for TriggersPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<TriggerEntered>().add_systems(
            Update,
            (detect_entries, (play_sound_triggers, run_object_activators))
                .chain()
                .run_if(in_state(GameScene::House)),
        );
    }
}

/// The player stepped into the volume on this entity this frame.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEntered {
    pub trigger: Entity,
}

/// Box region that reports when the player enters. Needs a `BoxExtent`.
#[derive(Component, Debug, Default)]
pub struct TriggerVolume {
    inside: bool,
}

impl TriggerVolume {
    /// Record whether the player is inside, returning true only on entry.
    fn update(&mut self, inside: bool) -> bool {
        let entered = inside && !self.inside;
        self.inside = inside;
        entered
    }
}

/// Starts every listed `SoundPlayer` on entry.
#[derive(Component, Debug, Default)]
pub struct SoundTrigger {
    pub players: Vec<Entity>,
    pub trigger_once: bool,
    fired: bool,
}

impl SoundTrigger {
    pub fn new(players: Vec<Entity>) -> Self {
        Self {
            players,
            ..default()
        }
    }
}

/// Shows, or with `deactivate` hides, the listed entities on entry.
#[derive(Component, Debug)]
pub struct ObjectActivator {
    pub objects: Vec<Entity>,
    pub trigger_once: bool,
    pub deactivate: bool,
    fired: bool,
}

impl ObjectActivator {
    pub fn new(objects: Vec<Entity>) -> Self {
        Self {
            objects,
            trigger_once: true,
            deactivate: false,
            fired: false,
        }
    }
}

fn detect_entries(
    player: Query<&Transform, With<Player>>,
    mut volumes: Query<(Entity, &mut TriggerVolume, &BoxExtent, &Transform), Without<Player>>,
    mut entered: MessageWriter<TriggerEntered>,
) {
    let Ok(player) = player.single() else {
        return;
    };
    for (entity, mut volume, extent, transform) in &mut volumes {
        let inside = extent.contains(transform.translation, player.translation);
        if volume.update(inside) {
            debug!("Player entered trigger {entity}");
            entered.write(TriggerEntered { trigger: entity });
        }
    }
}

fn play_sound_triggers(
    mut commands: Commands,
    mut entered: MessageReader<TriggerEntered>,
    mut triggers: Query<&mut SoundTrigger>,
    mut players: Query<&mut SoundPlayer>,
) {
    for TriggerEntered { trigger } in entered.read() {
        let Ok(mut sound_trigger) = triggers.get_mut(*trigger) else {
            continue;
        };
        if sound_trigger.trigger_once && sound_trigger.fired {
            continue;
        }
        sound_trigger.fired = true;
        for &entity in &sound_trigger.players {
            if let Ok(mut player) = players.get_mut(entity) {
                player.play(&mut commands, entity);
            }
        }
    }
}

fn run_object_activators(
    mut commands: Commands,
    mut entered: MessageReader<TriggerEntered>,
    mut activators: Query<&mut ObjectActivator>,
) {
    for TriggerEntered { trigger } in entered.read() {
        let Ok(mut activator) = activators.get_mut(*trigger) else {
            continue;
        };
        if activator.trigger_once && activator.fired {
            continue;
        }
        activator.fired = true;

        let visibility = if activator.deactivate {
            Visibility::Hidden
        } else {
            Visibility::Inherited
        };
        for &object in &activator.objects {
            if let Ok(mut entity) = commands.get_entity(object) {
                entity.insert(visibility);
            }
        }
        info!(
            "Object activator {trigger} {} {} objects",
            if activator.deactivate { "hid" } else { "showed" },
            activator.objects.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_reports_only_the_rising_edge() {
        let mut volume = TriggerVolume::default();
        assert!(!volume.update(false));
        assert!(volume.update(true));
        assert!(!volume.update(true));
        assert!(!volume.update(false));
        assert!(volume.update(true));
    }

    fn app_with_player_at(position: Vec3) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_message::<TriggerEntered>()
            .add_systems(Update, (detect_entries, run_object_activators).chain());
        app.world_mut()
            .spawn((Player, Transform::from_translation(position)));
        app
    }

    #[test]
    fn activator_shows_objects_once_when_player_enters() {
        let mut app = app_with_player_at(Vec3::ZERO);
        let ghost = app.world_mut().spawn(Visibility::Hidden).id();
        let trigger = app
            .world_mut()
            .spawn((
                TriggerVolume::default(),
                BoxExtent::cube(1.0),
                Transform::default(),
                ObjectActivator::new(vec![ghost]),
            ))
            .id();

        app.update();
        assert_eq!(
            app.world().get::<Visibility>(ghost),
            Some(&Visibility::Inherited)
        );

        // Hidden again by something else; a second entry does not re-show it.
        app.world_mut().entity_mut(ghost).insert(Visibility::Hidden);
        app.world_mut()
            .entity_mut(trigger)
            .insert(TriggerVolume::default());
        app.update();
        assert_eq!(
            app.world().get::<Visibility>(ghost),
            Some(&Visibility::Hidden)
        );
    }

    #[test]
    fn player_outside_the_box_does_not_trigger() {
        let mut app = app_with_player_at(Vec3::new(5.0, 0.0, 0.0));
        let ghost = app.world_mut().spawn(Visibility::Hidden).id();
        app.world_mut().spawn((
            TriggerVolume::default(),
            BoxExtent::cube(1.0),
            Transform::default(),
            ObjectActivator::new(vec![ghost]),
        ));

        app.update();
        assert_eq!(
            app.world().get::<Visibility>(ghost),
            Some(&Visibility::Hidden)
        );
    }
}

// Objects that vanish once the player stands close and looks away from them.
use bevy::prelude::*;

use crate::player::Player;
use crate::scenes::GameScene;
use crate::volume::{BoxExtent, view_angle};

pub struct LookAwayPlugin;

impl Plugin for LookAwayPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            check_look_away.run_if(in_state(GameScene::House)),
        );
    }
}

const CHECK_INTERVAL: f32 = 0.1;
const SAMPLES_PER_AXIS: usize = 3;

#[derive(Component, Debug)]
pub struct LookAwayDisappear {
    pub objects: Vec<Entity>,
    /// Degrees from the view direction beyond which a point counts as unseen.
    pub look_away_angle: f32,
    pub trigger_distance: f32,
    check: Timer,
    triggered: bool,
}

impl LookAwayDisappear {
    pub fn new(objects: Vec<Entity>) -> Self {
        Self {
            objects,
            look_away_angle: 60.0,
            trigger_distance: 3.0,
            check: Timer::from_seconds(CHECK_INTERVAL, TimerMode::Repeating),
            triggered: false,
        }
    }
}

/// True when every sample point of the box lies outside the view cone.
pub fn fully_out_of_view(
    eye: Vec3,
    forward: Vec3,
    extent: &BoxExtent,
    center: Vec3,
    max_angle: f32,
) -> bool {
    extent
        .sample_points(center, SAMPLES_PER_AXIS)
        .into_iter()
        .all(|point| view_angle(eye, forward, point) > max_angle)
}

fn check_look_away(
    mut commands: Commands,
    time: Res<Time>,
    player: Query<&Transform, With<Player>>,
    mut watchers: Query<(&mut LookAwayDisappear, &Transform), Without<Player>>,
    objects: Query<(&BoxExtent, &Transform, &Visibility), Without<Player>>,
) {
    let Ok(eye) = player.single() else {
        return;
    };
    let forward = eye.forward().as_vec3();

    for (mut watcher, transform) in &mut watchers {
        if watcher.triggered || !watcher.check.tick(time.delta()).just_finished() {
            continue;
        }
        if eye.translation.distance(transform.translation) > watcher.trigger_distance {
            continue;
        }

        let max_angle = watcher.look_away_angle.to_radians();
        let mut visible = watcher
            .objects
            .iter()
            .filter_map(|&entity| objects.get(entity).ok())
            .filter(|(_, _, visibility)| **visibility != Visibility::Hidden)
            .peekable();
        if visible.peek().is_none() {
            continue;
        }
        let unseen = visible.all(|(extent, object, _)| {
            fully_out_of_view(eye.translation, forward, extent, object.translation, max_angle)
        });
        if !unseen {
            continue;
        }

        watcher.triggered = true;
        for &entity in &watcher.objects {
            if let Ok(mut object) = commands.get_entity(entity) {
                object.insert(Visibility::Hidden);
            }
        }
        info!("{} objects disappeared behind the player", watcher.objects.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use bevy::time::TimeUpdateStrategy;

    #[test]
    fn box_behind_the_player_is_out_of_view() {
        let extent = BoxExtent::cube(0.5);
        let behind = Vec3::new(0.0, 0.0, 3.0);
        assert!(fully_out_of_view(Vec3::ZERO, Vec3::NEG_Z, &extent, behind, 60f32.to_radians()));

        let ahead = Vec3::new(0.0, 0.0, -3.0);
        assert!(!fully_out_of_view(Vec3::ZERO, Vec3::NEG_Z, &extent, ahead, 60f32.to_radians()));
    }

    #[test]
    fn a_corner_in_view_keeps_the_box_seen() {
        // Centre is at 90 degrees, but the near corner reaches into the cone.
        let extent = BoxExtent::cube(2.0);
        let side = Vec3::new(2.5, 0.0, 0.0);
        assert!(!fully_out_of_view(Vec3::ZERO, Vec3::NEG_Z, &extent, side, 60f32.to_radians()));
    }

    #[test]
    fn objects_hide_when_player_turns_away_nearby() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(50)))
            .add_systems(Update, check_look_away);

        // Player faces -Z; the figure stands behind them.
        app.world_mut().spawn((Player, Transform::default()));
        let figure = app
            .world_mut()
            .spawn((
                BoxExtent(Vec3::new(0.3, 0.9, 0.3)),
                Transform::from_xyz(0.0, 0.0, 2.0),
                Visibility::Visible,
            ))
            .id();
        app.world_mut().spawn((
            LookAwayDisappear::new(vec![figure]),
            Transform::from_xyz(0.0, 0.0, 1.0),
        ));

        for _ in 0..5 {
            app.update();
        }
        assert_eq!(
            app.world().get::<Visibility>(figure),
            Some(&Visibility::Hidden)
        );
    }
}

// Sound clips, one-shot playback and fading sound players.
use bevy::audio::{AudioSinkPlayback, Volume};
use bevy::prelude::*;

pub struct SoundPlugin;

impl Plugin for SoundPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SoundBank>()
            .add_systems(PreStartup, load_sound_bank)
            .add_systems(Update, fade_sound_players);
    }
}

/// Clips shared by the interaction and sequence systems.
#[derive(Resource, Default)]
pub struct SoundBank {
    pub door_open: Handle<AudioSource>,
    pub door_close: Handle<AudioSource>,
    pub window_lock: Handle<AudioSource>,
    pub footsteps: Handle<AudioSource>,
    pub knock: Handle<AudioSource>,
    pub ambience: Handle<AudioSource>,
    pub sheets_rustle: Handle<AudioSource>,
    pub kill: Handle<AudioSource>,
    pub gunshot: Handle<AudioSource>,
    pub water: Handle<AudioSource>,
    pub pickup: Handle<AudioSource>,
    pub credits_music: Handle<AudioSource>,
}

fn load_sound_bank(mut commands: Commands, asset_server: Res<AssetServer>) {
    commands.insert_resource(SoundBank {
        door_open: asset_server.load("audio/door_open.ogg"),
        door_close: asset_server.load("audio/door_close.ogg"),
        window_lock: asset_server.load("audio/window_lock.ogg"),
        footsteps: asset_server.load("audio/footsteps.ogg"),
        knock: asset_server.load("audio/knock.ogg"),
        ambience: asset_server.load("audio/ambience.ogg"),
        sheets_rustle: asset_server.load("audio/sheets_rustle.ogg"),
        kill: asset_server.load("audio/kill.ogg"),
        gunshot: asset_server.load("audio/gunshot.ogg"),
        water: asset_server.load("audio/water.ogg"),
        pickup: asset_server.load("audio/pickup.ogg"),
        credits_music: asset_server.load("audio/credits.ogg"),
    });
}

/// Fire-and-forget playback; the entity despawns when the clip ends.
pub fn play_once(commands: &mut Commands, clip: &Handle<AudioSource>, volume: f32) -> Entity {
    commands
        .spawn((
            AudioPlayer::new(clip.clone()),
            PlaybackSettings::DESPAWN.with_volume(Volume::Linear(volume)),
        ))
        .id()
}

/// A clip bound to an entity that can be started, stopped and faded in.
#[derive(Component, Debug, Clone)]
pub struct SoundPlayer {
    pub clip: Handle<AudioSource>,
    pub volume: f32,
    pub looped: bool,
    pub fade_in: bool,
    pub fade_in_secs: f32,
    current: f32,
    fading: bool,
}

impl SoundPlayer {
    pub fn new(clip: Handle<AudioSource>, volume: f32) -> Self {
        Self {
            clip,
            volume: volume.clamp(0.0, 1.0),
            looped: false,
            fade_in: true,
            fade_in_secs: 1.0,
            current: 0.0,
            fading: false,
        }
    }

    pub fn looped(mut self) -> Self {
        self.looped = true;
        self
    }

    /// Volume the clip starts at, arming the fade when enabled.
    fn start(&mut self) -> f32 {
        if self.fade_in && self.fade_in_secs > 0.0 {
            self.current = 0.0;
            self.fading = true;
        } else {
            self.current = self.volume;
            self.fading = false;
        }
        self.current
    }

    /// Advance the fade, returning the new volume while still fading.
    fn fade_step(&mut self, dt: f32) -> Option<f32> {
        if !self.fading {
            return None;
        }
        let rate = self.volume / self.fade_in_secs;
        self.current = move_towards(self.current, self.volume, rate * dt);
        if (self.current - self.volume).abs() <= f32::EPSILON {
            self.fading = false;
        }
        Some(self.current)
    }

    pub fn play(&mut self, commands: &mut Commands, entity: Entity) {
        let start = self.start();
        let settings = if self.looped {
            PlaybackSettings::LOOP
        } else {
            PlaybackSettings::REMOVE
        };
        commands
            .entity(entity)
            .remove::<(AudioPlayer, AudioSink)>()
            .insert((
                AudioPlayer::new(self.clip.clone()),
                settings.with_volume(Volume::Linear(start)),
            ));
    }

    pub fn stop(&mut self, commands: &mut Commands, entity: Entity, sink: Option<&AudioSink>) {
        if let Some(sink) = sink {
            sink.stop();
        }
        self.fading = false;
        commands.entity(entity).remove::<(AudioPlayer, AudioSink)>();
    }

    pub fn pause(sink: &AudioSink) {
        sink.pause();
    }

    pub fn resume(sink: &AudioSink) {
        sink.play();
    }
}

pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

fn fade_sound_players(time: Res<Time>, mut players: Query<(&mut SoundPlayer, Option<&mut AudioSink>)>) {
    let dt = time.delta_secs();
    for (mut player, sink) in &mut players {
        if let Some(volume) = player.fade_step(dt) {
            if let Some(mut sink) = sink {
                sink.set_volume(Volume::Linear(volume));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_towards_stops_at_target() {
        assert_eq!(move_towards(0.0, 1.0, 0.25), 0.25);
        assert_eq!(move_towards(0.9, 1.0, 0.25), 1.0);
        assert_eq!(move_towards(1.0, 0.0, 0.5), 0.5);
    }

    #[test]
    fn fade_in_ramps_to_volume() {
        let mut player = SoundPlayer::new(Handle::default(), 0.8);
        player.fade_in_secs = 2.0;
        assert_eq!(player.start(), 0.0);

        let v = player.fade_step(1.0).unwrap();
        assert!((v - 0.4).abs() < 1e-5);
        let v = player.fade_step(1.5).unwrap();
        assert_eq!(v, 0.8);
        assert_eq!(player.fade_step(0.1), None);
    }

    #[test]
    fn no_fade_starts_at_full_volume() {
        let mut player = SoundPlayer::new(Handle::default(), 0.5);
        player.fade_in = false;
        assert_eq!(player.start(), 0.5);
        assert_eq!(player.fade_step(0.1), None);
    }
}

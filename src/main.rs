// Main
mod fader;
mod house;
mod interactable;
mod interactor;
mod look_away;
mod menu;
mod options;
mod pause;
mod player;
mod pursuer;
mod scenes;
mod sequences;
mod settings;
mod sound;
mod text_trigger;
mod timeline;
mod triggers;
mod volume;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use fader::FaderPlugin;
use house::HousePlugin;
use interactor::InteractorPlugin;
use look_away::LookAwayPlugin;
use menu::MenuPlugin;
use options::OptionsPlugin;
use pause::PausePlugin;
use player::PlayerPlugin;
use pursuer::PursuerPlugin;
use scenes::{GameFlags, GameScene};
use sequences::SequencesPlugin;
use settings::SettingsPlugin;
use sound::SoundPlugin;
use text_trigger::TextTriggerPlugin;
use triggers::TriggersPlugin;

fn main() {
    App::new()
        .add_plugins(
            DefaultPlugins
                .set(LogPlugin {
                    filter: "wgpu=error,naga=warn,hollow_house=debug".to_string(),
                    ..default()
                })
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Hollow House".to_string(),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .init_state::<GameScene>()
        .init_resource::<GameFlags>()
        .add_plugins((SettingsPlugin, SoundPlugin, FaderPlugin, PlayerPlugin))
        .add_plugins((
            MenuPlugin,
            OptionsPlugin,
            PausePlugin,
            HousePlugin,
            InteractorPlugin,
            TriggersPlugin,
            TextTriggerPlugin,
            LookAwayPlugin,
            PursuerPlugin,
            SequencesPlugin,
        ))
        .run();
}

// Timed subtitle messages, started by trigger volumes or by refused interactions.
use bevy::prelude::*;
use bevy::ui::FocusPolicy;

use crate::scenes::GameScene;
use crate::timeline::{Channel, Step, Timeline};
use crate::triggers::TriggerEntered;

pub struct TextTriggerPlugin;

impl Plugin for TextTriggerPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<StartTextTrigger>()
            .add_systems(Startup, spawn_subtitle)
            .add_systems(
                Update,
                (start_on_entry, start_on_request, play_text_triggers)
                    .chain()
                    .run_if(in_state(GameScene::House)),
            )
            .add_systems(OnExit(GameScene::House), clear_subtitle);
    }
}

/// Ask the `TextTrigger` on this entity to show its lines.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartTextTrigger(pub Entity);

const BASE_DISPLAY_SECS: f32 = 2.0;
const SECS_PER_CHAR: f32 = 0.05;
const SECS_BETWEEN_LINES: f32 = 0.5;
const FADE_SECS: f32 = 0.3;

#[derive(Component)]
pub struct Subtitle;

#[derive(Component, Debug, Clone)]
pub struct TextTrigger {
    pub lines: Vec<String>,
    pub base_display_secs: f32,
    pub secs_per_char: f32,
    pub secs_between_lines: f32,
    pub fade_in_secs: f32,
    pub fade_out_secs: f32,
    pub auto_trigger_on_enter: bool,
    pub one_time_only: bool,
    has_triggered: bool,
    /// Cues carry the index of the line to show.
    playback: Option<Timeline<usize>>,
}

impl TextTrigger {
    pub fn new<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            base_display_secs: BASE_DISPLAY_SECS,
            secs_per_char: SECS_PER_CHAR,
            secs_between_lines: SECS_BETWEEN_LINES,
            fade_in_secs: FADE_SECS,
            fade_out_secs: FADE_SECS,
            auto_trigger_on_enter: true,
            one_time_only: true,
            has_triggered: false,
            playback: None,
        }
    }

    /// Only started by interactions, never by walking into it.
    pub fn on_request(mut self) -> Self {
        self.auto_trigger_on_enter = false;
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.one_time_only = false;
        self
    }

    pub fn is_displaying(&self) -> bool {
        self.playback.is_some()
    }

    pub fn display_secs(&self, line: &str) -> f32 {
        self.base_display_secs + line.chars().count() as f32 * self.secs_per_char
    }

    /// Start showing the lines. Ignored while already showing, or when a
    /// one-time trigger has fired before.
    pub fn trigger(&mut self) -> bool {
        if self.is_displaying() || (self.one_time_only && self.has_triggered) {
            return false;
        }
        self.has_triggered = true;

        let mut steps = Vec::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                steps.push(Step::Wait(self.secs_between_lines));
            }
            steps.push(Step::Cue(i));
            steps.push(Step::fade(0.0, 1.0, self.fade_in_secs));
            steps.push(Step::Wait(self.display_secs(line)));
            steps.push(Step::fade(1.0, 0.0, self.fade_out_secs));
        }
        self.playback = Some(Timeline::new(steps));
        true
    }

    /// Advance playback, returning the line to show and the subtitle alpha.
    fn advance(&mut self, dt: f32) -> (Option<&str>, Option<f32>) {
        let Some(playback) = self.playback.as_mut() else {
            return (None, None);
        };
        let frame = playback.advance(dt);
        if frame.finished {
            self.playback = None;
        }
        let line = frame
            .cues
            .last()
            .and_then(|&i| self.lines.get(i))
            .map(String::as_str);
        (line, frame.sample(Channel::Fade))
    }
}

fn spawn_subtitle(mut commands: Commands) {
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                bottom: Val::Px(64.0),
                justify_content: JustifyContent::Center,
                ..default()
            },
            GlobalZIndex(50),
            FocusPolicy::Pass,
        ))
        .with_children(|parent| {
            parent.spawn((
                Subtitle,
                Text::new(""),
                TextFont {
                    font_size: 26.0,
                    ..default()
                },
                TextColor(Color::srgba(1.0, 1.0, 1.0, 0.0)),
                FocusPolicy::Pass,
            ));
        });
}

fn start_on_entry(
    mut entered: MessageReader<TriggerEntered>,
    mut triggers: Query<&mut TextTrigger>,
) {
    for TriggerEntered { trigger } in entered.read() {
        let Ok(mut text) = triggers.get_mut(*trigger) else {
            continue;
        };
        if text.auto_trigger_on_enter {
            text.trigger();
        }
    }
}

fn start_on_request(
    mut requests: MessageReader<StartTextTrigger>,
    mut triggers: Query<&mut TextTrigger>,
) {
    for StartTextTrigger(entity) in requests.read() {
        match triggers.get_mut(*entity) {
            Ok(mut text) => {
                text.trigger();
            }
            Err(_) => warn!("No text trigger on {entity}"),
        }
    }
}

fn play_text_triggers(
    time: Res<Time>,
    mut triggers: Query<&mut TextTrigger>,
    mut subtitle: Query<(&mut Text, &mut TextColor), With<Subtitle>>,
) {
    let Ok((mut text, mut color)) = subtitle.single_mut() else {
        return;
    };
    let dt = time.delta_secs();
    for mut trigger in &mut triggers {
        if !trigger.is_displaying() {
            continue;
        }
        let (line, alpha) = trigger.advance(dt);
        if let Some(line) = line {
            text.0 = line.to_string();
        }
        if let Some(alpha) = alpha {
            color.0 = color.0.with_alpha(alpha);
        }
    }
}

fn clear_subtitle(mut subtitle: Query<(&mut Text, &mut TextColor), With<Subtitle>>) {
    for (mut text, mut color) in &mut subtitle {
        text.0.clear();
        color.0 = color.0.with_alpha(0.0);
    }
}

// Credits: three knocks reveal the title, then the credits roll back to the menu.
use bevy::prelude::*;

use crate::fader::ScreenTint;
use crate::scenes::GameScene;
use crate::sound::{SoundBank, play_once};
use crate::timeline::{Step, Timeline};

pub struct CreditsPlugin;

impl Plugin for CreditsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameScene::Credits), setup_credits)
            .add_systems(
                Update,
                (run_credits, skip_credits)
                    .chain()
                    .run_if(in_state(GameScene::Credits)),
            )
            .add_systems(OnExit(GameScene::Credits), |mut commands: Commands| {
                commands.remove_resource::<Credits>();
            });
    }
}

const START_DELAY_SECS: f32 = 0.5;
const KNOCK_INTERVAL: f32 = 0.3;
const KNOCK_VOLUME: f32 = 1.0;
const MUSIC_VOLUME: f32 = 0.8;
const TITLE_HOLD_SECS: f32 = 1.0;
const SCROLL_SPEED: f32 = 50.0;
const END_DELAY_SECS: f32 = 2.0;
const COLUMN_START_TOP: f32 = 160.0;

const TITLE_CARDS: [&str; 3] = ["HOLLOW", "HOUSE", "knock, knock, knock"];
const CREDITS: &[(&str, &str)] = &[
    ("Design & Programming", "The Hollow House team"),
    ("Sound", "Field recordings and foley"),
    ("Built with", "Bevy"),
    ("", "Thank you for playing"),
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum CreditsCue {
    Knock(usize),
    StartScroll,
}

/// Upward scroll of the credits column, in logical pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditsRoll {
    pub top: f32,
    pub speed: f32,
}

impl CreditsRoll {
    pub fn new(top: f32) -> Self {
        Self {
            top,
            speed: SCROLL_SPEED,
        }
    }

    /// Move up by one step; true once the whole column has left the top edge.
    pub fn scroll(&mut self, dt: f32, content_height: f32) -> bool {
        if self.is_off_screen(content_height) {
            return true;
        }
        self.top -= self.speed * dt;
        self.is_off_screen(content_height)
    }

    pub fn is_off_screen(&self, content_height: f32) -> bool {
        self.top + content_height <= 0.0
    }
}

#[derive(Resource)]
struct Credits {
    timeline: Timeline<CreditsCue>,
    roll: CreditsRoll,
    scrolling: bool,
    end_delay: Option<Timer>,
}

#[derive(Component)]
struct CreditsColumn;

#[derive(Component)]
struct TitleCard(usize);

#[derive(Component)]
struct CreditsBlock;

fn credits_timeline() -> Timeline<CreditsCue> {
    let mut steps = vec![Step::Wait(START_DELAY_SECS)];
    for index in 0..TITLE_CARDS.len() {
        if index > 0 {
            steps.push(Step::Wait(KNOCK_INTERVAL));
        }
        steps.push(Step::Cue(CreditsCue::Knock(index)));
    }
    steps.extend([
        Step::Wait(TITLE_HOLD_SECS),
        Step::Cue(CreditsCue::StartScroll),
    ]);
    Timeline::new(steps)
}

fn setup_credits(mut commands: Commands, mut tint: ResMut<ScreenTint>) {
    *tint = ScreenTint::default();

    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                ..default()
            },
            BackgroundColor(Color::BLACK),
            DespawnOnExit(GameScene::Credits),
        ))
        .with_children(|root| {
            root.spawn((
                CreditsColumn,
                Node {
                    position_type: PositionType::Absolute,
                    top: Val::Px(COLUMN_START_TOP),
                    width: Val::Percent(100.0),
                    flex_direction: FlexDirection::Column,
                    align_items: AlignItems::Center,
                    row_gap: Val::Px(12.0),
                    ..default()
                },
            ))
            .with_children(|column| {
                for (index, title) in TITLE_CARDS.iter().enumerate() {
                    column.spawn((
                        TitleCard(index),
                        Text::new(*title),
                        TextFont {
                            font_size: if index < 2 { 72.0 } else { 28.0 },
                            ..default()
                        },
                        TextColor(Color::srgb(0.75, 0.72, 0.65)),
                        Visibility::Hidden,
                    ));
                }

                column
                    .spawn((
                        CreditsBlock,
                        Node {
                            flex_direction: FlexDirection::Column,
                            align_items: AlignItems::Center,
                            row_gap: Val::Px(48.0),
                            margin: UiRect::top(Val::Px(120.0)),
                            ..default()
                        },
                        Visibility::Hidden,
                    ))
                    .with_children(|block| {
                        for (role, name) in CREDITS {
                            block
                                .spawn(Node {
                                    flex_direction: FlexDirection::Column,
                                    align_items: AlignItems::Center,
                                    row_gap: Val::Px(8.0),
                                    ..default()
                                })
                                .with_children(|entry| {
                                    if !role.is_empty() {
                                        entry.spawn((
                                            Text::new(*role),
                                            TextFont {
                                                font_size: 20.0,
                                                ..default()
                                            },
                                            TextColor(Color::srgb(0.5, 0.5, 0.5)),
                                        ));
                                    }
                                    entry.spawn((
                                        Text::new(*name),
                                        TextFont {
                                            font_size: 28.0,
                                            ..default()
                                        },
                                        TextColor(Color::WHITE),
                                    ));
                                });
                        }
                    });
            });
        });

    commands.insert_resource(Credits {
        timeline: credits_timeline(),
        roll: CreditsRoll::new(COLUMN_START_TOP),
        scrolling: false,
        end_delay: None,
    });
    info!("Rolling credits");
}

fn run_credits(
    mut commands: Commands,
    time: Res<Time>,
    credits: Option<ResMut<Credits>>,
    bank: Res<SoundBank>,
    mut cards: Query<(&TitleCard, &mut Visibility), Without<CreditsBlock>>,
    mut block: Query<&mut Visibility, With<CreditsBlock>>,
    mut column: Query<(&mut Node, &ComputedNode), With<CreditsColumn>>,
    mut next_scene: ResMut<NextState<GameScene>>,
) {
    let Some(mut credits) = credits else {
        return;
    };
    let dt = time.delta_secs();

    for cue in credits.timeline.advance(dt).cues {
        match cue {
            CreditsCue::Knock(index) => {
                play_once(&mut commands, &bank.knock, KNOCK_VOLUME);
                for (card, mut visibility) in &mut cards {
                    if card.0 == index {
                        *visibility = Visibility::Inherited;
                    }
                }
            }
            CreditsCue::StartScroll => {
                if let Ok(mut visibility) = block.single_mut() {
                    *visibility = Visibility::Inherited;
                }
                let music = play_once(&mut commands, &bank.credits_music, MUSIC_VOLUME);
                commands
                    .entity(music)
                    .insert(DespawnOnExit(GameScene::Credits));
                credits.scrolling = true;
            }
        }
    }

    if let Some(timer) = credits.end_delay.as_mut() {
        if timer.tick(time.delta()).just_finished() {
            next_scene.set(GameScene::MainMenu);
        }
        return;
    }

    if !credits.scrolling {
        return;
    }
    let Ok((mut node, computed)) = column.single_mut() else {
        return;
    };
    let height = computed.size().y * computed.inverse_scale_factor();
    // Layout has not run for the revealed block yet.
    if height <= 0.0 {
        return;
    }
    let done = credits.roll.scroll(dt, height);
    node.top = Val::Px(credits.roll.top);
    if done {
        credits.end_delay = Some(Timer::from_seconds(END_DELAY_SECS, TimerMode::Once));
    }
}

fn skip_credits(
    keyboard: Res<ButtonInput<KeyCode>>,
    credits: Option<Res<Credits>>,
    mut next_scene: ResMut<NextState<GameScene>>,
) {
    let Some(credits) = credits else {
        return;
    };
    if credits.scrolling && keyboard.any_just_pressed([KeyCode::Escape, KeyCode::Space]) {
        info!("Credits skipped");
        next_scene.set(GameScene::MainMenu);
    }
}

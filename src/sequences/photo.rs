// Viewing a photo: the card fades in, holds, and fades out.
use bevy::prelude::*;

use super::{StartSequence, release_player};
use crate::interactor::Interactor;
use crate::player::{Player, PlayerControl};
use crate::scenes::{GameFlags, GameScene};
use crate::timeline::{Channel, Step, Timeline};

pub struct PhotoPlugin;

impl Plugin for PhotoPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (start_photo, run_photo).chain().run_if(in_state(GameScene::House)),
        )
        .add_systems(OnExit(GameScene::House), |mut commands: Commands| {
            commands.remove_resource::<PhotoView>();
        });
    }
}

const FADE_SECS: f32 = 0.5;
const CARD_COLOR: Color = Color::srgb(0.08, 0.07, 0.06);

#[derive(Debug, Clone, Copy, PartialEq)]
enum PhotoCue {
    Release,
}

#[derive(Resource)]
struct PhotoView {
    timeline: Timeline<PhotoCue>,
    card: Entity,
}

#[derive(Component)]
struct PhotoCard;

fn start_photo(
    mut commands: Commands,
    mut requests: MessageReader<StartSequence>,
    mut player: Query<&mut PlayerControl, With<Player>>,
) {
    for request in requests.read() {
        let StartSequence::Photo(photo) = request else {
            continue;
        };
        if let Ok(mut control) = player.single_mut() {
            control.lock();
        }

        let card = commands
            .spawn((
                PhotoCard,
                Node {
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    position_type: PositionType::Absolute,
                    justify_content: JustifyContent::Center,
                    align_items: AlignItems::Center,
                    ..default()
                },
                BackgroundColor(CARD_COLOR.with_alpha(0.0)),
                GlobalZIndex(80),
                DespawnOnExit(GameScene::House),
            ))
            .with_children(|parent| {
                parent.spawn((
                    PhotoCard,
                    Text::new(photo.caption.clone()),
                    TextFont {
                        font_size: 28.0,
                        ..default()
                    },
                    TextColor(Color::srgba(0.9, 0.88, 0.8, 0.0)),
                ));
            })
            .id();

        commands.insert_resource(PhotoView {
            timeline: Timeline::new([
                Step::fade(0.0, 1.0, FADE_SECS),
                Step::Wait(photo.view_seconds),
                Step::fade(1.0, 0.0, FADE_SECS),
                Step::Cue(PhotoCue::Release),
            ]),
            card,
        });
        info!("Viewing photo: {}", photo.caption);
    }
}

fn run_photo(
    mut commands: Commands,
    time: Res<Time>,
    flags: Res<GameFlags>,
    view: Option<ResMut<PhotoView>>,
    mut backgrounds: Query<&mut BackgroundColor, With<PhotoCard>>,
    mut texts: Query<&mut TextColor, With<PhotoCard>>,
    mut player: Query<(&mut PlayerControl, &mut Interactor), With<Player>>,
) {
    let Some(mut view) = view else {
        return;
    };
    let frame = view.timeline.advance(time.delta_secs());

    if let Some(alpha) = frame.sample(Channel::Fade) {
        for mut bg in &mut backgrounds {
            bg.0 = bg.0.with_alpha(alpha);
        }
        for mut color in &mut texts {
            color.0 = color.0.with_alpha(alpha);
        }
    }

    for cue in frame.cues {
        match cue {
            PhotoCue::Release => {
                commands.entity(view.card).despawn();
                if let Ok((mut control, mut interactor)) = player.single_mut() {
                    release_player(&flags, &mut control, &mut interactor);
                }
            }
        }
    }

    if frame.finished {
        commands.remove_resource::<PhotoView>();
    }
}

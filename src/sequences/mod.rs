// Scripted sequences. Each one is a timeline resource that lives while it plays.
mod credits;
mod final_door;
mod gunshot;
mod hospital;
mod intro;
mod padded_room;
mod photo;
mod sink;

use bevy::prelude::*;

use crate::interactable::Photo;
use crate::interactor::Interactor;
use crate::player::PlayerControl;
use crate::scenes::GameFlags;

pub use credits::CreditsPlugin;
pub use final_door::FinalDoorPlugin;
pub use gunshot::GunshotPlugin;
pub use hospital::HospitalPlugin;
pub use intro::IntroPlugin;
pub use padded_room::PaddedRoomPlugin;
pub use photo::PhotoPlugin;
pub use sink::SinkPlugin;

pub struct SequencesPlugin;

impl Plugin for SequencesPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<StartSequence>().add_plugins((
            IntroPlugin,
            PhotoPlugin,
            SinkPlugin,
            FinalDoorPlugin,
            GunshotPlugin,
            PaddedRoomPlugin,
            HospitalPlugin,
            CreditsPlugin,
        ));
    }
}

/// Sequences started from gameplay in the house.
#[derive(Message, Debug, Clone)]
pub enum StartSequence {
    Photo(Photo),
    Sink { message: Option<Entity> },
    FinalDoor { door: Entity },
    Gunshot { pursuer: Entity },
}

/// Hand the player back after a sequence that locked them. Once an ending
/// has started the player stays locked.
fn release_player(flags: &GameFlags, control: &mut PlayerControl, interactor: &mut Interactor) {
    if flags.ending_triggered() {
        return;
    }
    control.unlock();
    interactor.release();
}

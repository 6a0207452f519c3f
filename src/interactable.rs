// Things the player can act on, their verbs, and the door lock graph.
use std::collections::HashMap;

use bevy::prelude::*;
use strum::{Display, IntoStaticStr};

use crate::scenes::GameFlags;

/// Stable name of a door, used to wire lock links between doors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DoorId(pub &'static str);

/// Why a verb did nothing. Displayed to the player through message triggers and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Refusal {
    #[strum(to_string = "That doesn't work on this")]
    WrongKind,
    #[strum(to_string = "This door is locked")]
    Locked,
    #[strum(to_string = "You need to find a light source before leaving...")]
    NeedsLantern,
    #[strum(to_string = "The door is jammed shut")]
    Jammed,
    #[strum(to_string = "This window is already locked")]
    AlreadyLocked,
    #[strum(to_string = "Nothing more to do here")]
    AlreadyUsed,
    #[strum(to_string = "You don't need that yet")]
    NotYet,
    #[strum(to_string = "Not without something to defend yourself")]
    NeedsGun,
}

/// Where a door sends the player, depending on how far the night has gone.
#[derive(Debug, Clone, PartialEq)]
pub struct DoorTargets {
    pub default: Transform,
    pub after_crowbar: Option<Transform>,
    pub after_house_switch: Option<Transform>,
}

impl DoorTargets {
    pub fn to(target: Transform) -> Self {
        Self {
            default: target,
            after_crowbar: None,
            after_house_switch: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Door {
    pub id: DoorId,
    pub targets: DoorTargets,
    /// Locks itself after the first successful use.
    pub one_time_use: bool,
    pub requires_lantern: bool,
    pub locked: bool,
    /// Refuses until the player carries the crowbar.
    pub jammed: bool,
    /// Text trigger started when the door refuses.
    pub locked_message: Option<Entity>,
}

impl Door {
    pub fn new(id: DoorId, targets: DoorTargets) -> Self {
        Self {
            id,
            targets,
            one_time_use: false,
            requires_lantern: false,
            locked: false,
            jammed: false,
            locked_message: None,
        }
    }

    /// Later story beats take priority: house switch, then crowbar, then default.
    pub fn resolve_target(&self, flags: &GameFlags) -> Transform {
        if flags.all_windows_locked {
            if let Some(target) = self.targets.after_house_switch {
                return target;
            }
        }
        if flags.has_crowbar {
            if let Some(target) = self.targets.after_crowbar {
                return target;
            }
        }
        self.targets.default
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lantern {
    pub light_to_enable: Option<Entity>,
    pub light_to_disable: Option<Entity>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowLatch {
    pub locked: bool,
    pub lock_volume: f32,
}

impl Default for WindowLatch {
    fn default() -> Self {
        Self {
            locked: false,
            lock_volume: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub caption: String,
    pub view_seconds: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BathroomSink {
    pub used: bool,
    pub requires_lantern: bool,
    pub message: Option<Entity>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinalDoor {
    pub opened: bool,
    pub refusal_message: Option<Entity>,
}

#[derive(Component, Debug, Clone, PartialEq, IntoStaticStr)]
pub enum Interactable {
    Generic,
    Door(Door),
    Lantern(Lantern),
    Window(WindowLatch),
    Photo(Photo),
    Crowbar,
    BathroomSink(BathroomSink),
    FinalDoor(FinalDoor),
    Gun,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoorOpened {
    pub id: DoorId,
    pub target: Transform,
    /// The door locked itself, so its graph links should fire.
    pub locked_self: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowLocked {
    pub volume: f32,
    /// This lock was the one that completed the set.
    pub completed_set: bool,
}

/// What a successful interaction did, for the caller to play out.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Inspected,
    DoorOpened(DoorOpened),
    LanternTaken(Lantern),
    WindowLocked(WindowLocked),
    PhotoViewed(Photo),
    CrowbarTaken,
    SinkUsed { message: Option<Entity> },
    FinalDoorOpened,
    GunTaken,
}

impl Interactable {
    /// Run the verb that matches this variant.
    pub fn interact(&mut self, flags: &mut GameFlags) -> Result<Outcome, Refusal> {
        match self {
            Interactable::Generic => {
                info!("Interacted with a generic object");
                Ok(Outcome::Inspected)
            }
            Interactable::Door(_) => self.use_door(flags).map(Outcome::DoorOpened),
            Interactable::Lantern(_) => self.pickup_lantern(flags).map(Outcome::LanternTaken),
            Interactable::Window(_) => self.lock_window(flags).map(Outcome::WindowLocked),
            Interactable::Photo(_) => self.view_photo().map(Outcome::PhotoViewed),
            Interactable::Crowbar => self.pickup_crowbar(flags).map(|()| Outcome::CrowbarTaken),
            Interactable::BathroomSink(sink) => {
                let message = sink.message;
                self.use_bathroom_sink(flags)
                    .map(|()| Outcome::SinkUsed { message })
            }
            Interactable::FinalDoor(_) => self
                .open_final_door(flags)
                .map(|()| Outcome::FinalDoorOpened),
            Interactable::Gun => self.pickup_gun(flags).map(|()| Outcome::GunTaken),
        }
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }

    fn wrong_kind(&self, verb: &str) -> Refusal {
        warn!("{verb} called on {} interactable", self.name());
        Refusal::WrongKind
    }

    /// Shown with the lock icon instead of the interact icon.
    pub fn shows_lock(&self) -> bool {
        match self {
            Interactable::Door(door) => door.locked || door.jammed,
            Interactable::Window(window) => window.locked,
            _ => false,
        }
    }

    /// Message trigger to start when a verb on this entity is refused.
    pub fn refusal_message(&self) -> Option<Entity> {
        match self {
            Interactable::Door(door) => door.locked_message,
            Interactable::FinalDoor(door) => door.refusal_message,
            _ => None,
        }
    }

    pub fn use_door(&mut self, flags: &mut GameFlags) -> Result<DoorOpened, Refusal> {
        let Interactable::Door(door) = self else {
            return Err(self.wrong_kind("use_door"));
        };

        if door.locked {
            info!("Door {} is locked", door.id.0);
            return Err(Refusal::Locked);
        }
        if door.requires_lantern && !flags.has_lantern {
            info!("Door {} needs the lantern", door.id.0);
            return Err(Refusal::NeedsLantern);
        }
        if door.jammed {
            if !flags.has_crowbar {
                flags.jammed_door_checked = true;
                info!("Door {} is jammed", door.id.0);
                return Err(Refusal::Jammed);
            }
            door.jammed = false;
            info!("Pried door {} open with the crowbar", door.id.0);
        }

        if door.one_time_use {
            door.locked = true;
            info!("Door {} is now locked", door.id.0);
        }

        Ok(DoorOpened {
            id: door.id,
            target: door.resolve_target(flags),
            locked_self: door.one_time_use,
        })
    }

    pub fn lock_door(&mut self) {
        match self {
            Interactable::Door(door) => {
                door.locked = true;
                info!("Door {} is now locked", door.id.0);
            }
            _ => {
                self.wrong_kind("lock_door");
            }
        }
    }

    pub fn unlock_door(&mut self) {
        match self {
            Interactable::Door(door) => {
                door.locked = false;
                info!("Door {} is now unlocked", door.id.0);
            }
            _ => {
                self.wrong_kind("unlock_door");
            }
        }
    }

    pub fn pickup_lantern(&mut self, flags: &mut GameFlags) -> Result<Lantern, Refusal> {
        let Interactable::Lantern(lantern) = self else {
            return Err(self.wrong_kind("pickup_lantern"));
        };
        flags.has_lantern = true;
        info!("Lantern picked up");
        Ok(lantern.clone())
    }

    pub fn pickup_crowbar(&mut self, flags: &mut GameFlags) -> Result<(), Refusal> {
        if !matches!(self, Interactable::Crowbar) {
            return Err(self.wrong_kind("pickup_crowbar"));
        }
        if !flags.jammed_door_checked {
            info!("Crowbar left alone, nothing to pry yet");
            return Err(Refusal::NotYet);
        }
        flags.has_crowbar = true;
        info!("Crowbar picked up");
        Ok(())
    }

    pub fn lock_window(&mut self, flags: &mut GameFlags) -> Result<WindowLocked, Refusal> {
        let Interactable::Window(window) = self else {
            return Err(self.wrong_kind("lock_window"));
        };
        if window.locked {
            info!("This window is already locked");
            return Err(Refusal::AlreadyLocked);
        }

        window.locked = true;
        flags.locked_windows += 1;
        info!(
            "Window locked ({}/{})",
            flags.locked_windows, flags.total_windows
        );

        let completed_set =
            !flags.all_windows_locked && flags.locked_windows >= flags.total_windows;
        if completed_set {
            flags.all_windows_locked = true;
            info!("All windows are now locked");
        }

        Ok(WindowLocked {
            volume: window.lock_volume,
            completed_set,
        })
    }

    pub fn view_photo(&self) -> Result<Photo, Refusal> {
        match self {
            Interactable::Photo(photo) => Ok(photo.clone()),
            _ => Err(self.wrong_kind("view_photo")),
        }
    }

    pub fn use_bathroom_sink(&mut self, flags: &mut GameFlags) -> Result<(), Refusal> {
        let Interactable::BathroomSink(sink) = self else {
            return Err(self.wrong_kind("use_bathroom_sink"));
        };
        if sink.used {
            return Err(Refusal::AlreadyUsed);
        }
        if sink.requires_lantern && !flags.has_lantern {
            return Err(Refusal::NeedsLantern);
        }
        sink.used = true;
        info!("Bathroom sink turned on");
        Ok(())
    }

    pub fn open_final_door(&mut self, flags: &mut GameFlags) -> Result<(), Refusal> {
        let Interactable::FinalDoor(door) = self else {
            return Err(self.wrong_kind("open_final_door"));
        };
        if door.opened {
            return Err(Refusal::AlreadyUsed);
        }
        if !flags.has_gun {
            info!("Final door refused, player is unarmed");
            return Err(Refusal::NeedsGun);
        }
        door.opened = true;
        info!("Final door opening");
        Ok(())
    }

    pub fn pickup_gun(&mut self, flags: &mut GameFlags) -> Result<(), Refusal> {
        if !matches!(self, Interactable::Gun) {
            return Err(self.wrong_kind("pickup_gun"));
        }
        flags.has_gun = true;
        info!("Gun picked up");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorLink {
    /// When the source door locks itself, unlock this one.
    UnlockOnLock(DoorId),
    /// When the source door is used up, lock this one.
    LockOnUse(DoorId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockChange {
    Lock(DoorId),
    Unlock(DoorId),
}

/// Directed lock links between doors, keyed by door id.
#[derive(Resource, Debug, Default)]
pub struct DoorGraph {
    edges: HashMap<DoorId, Vec<DoorLink>>,
}

impl DoorGraph {
    pub fn link(&mut self, from: DoorId, link: DoorLink) -> &mut Self {
        self.edges.entry(from).or_default().push(link);
        self
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }

    /// Lock changes caused by `door` locking itself after use, in link order.
    pub fn changes_after_use(&self, door: DoorId) -> Vec<LockChange> {
        self.edges
            .get(&door)
            .map(|links| {
                links
                    .iter()
                    .map(|link| match *link {
                        DoorLink::UnlockOnLock(target) => LockChange::Unlock(target),
                        DoorLink::LockOnUse(target) => LockChange::Lock(target),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

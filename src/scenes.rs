/// Game scenes and shared game state.
use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum GameScene {
    #[default]
    MainMenu,
    House,
    PaddedRoom,
    Hospital,
    Credits,
}

/// Flags that persist across scene transitions. Only `reset` clears them.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct GameFlags {
    pub has_lantern: bool,
    pub has_crowbar: bool,
    pub has_gun: bool,
    pub locked_windows: u32,
    pub total_windows: u32,
    /// Latches once every window has been locked.
    pub all_windows_locked: bool,
    pub jammed_door_checked: bool,
    pub shot_ending_triggered: bool,
    pub caught_ending_triggered: bool,
}

impl GameFlags {
    pub fn reset(&mut self) {
        *self = GameFlags::default();
        info!("All flags reset");
    }

    pub fn ending_triggered(&self) -> bool {
        self.shot_ending_triggered || self.caught_ending_triggered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_every_flag() {
        let mut flags = GameFlags {
            has_lantern: true,
            has_crowbar: true,
            has_gun: true,
            locked_windows: 3,
            total_windows: 3,
            all_windows_locked: true,
            jammed_door_checked: true,
            shot_ending_triggered: true,
            caught_ending_triggered: false,
        };
        assert!(flags.ending_triggered());

        flags.reset();
        assert_eq!(flags, GameFlags::default());
        assert!(!flags.ending_triggered());
    }
}

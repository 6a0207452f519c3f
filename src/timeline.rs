// Timelines of waits, tweens and cues, advanced by an explicit frame delta.
use std::collections::VecDeque;

/// Which value a tween drives. Each sequence decides what a channel means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Alpha of the full-screen overlay, or of a sequence's own card.
    Fade,
    /// Normalized progress of a camera move.
    Camera,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ease {
    #[default]
    Linear,
    /// Starts fast and settles, `sqrt(1 - (x - 1)^2)`.
    OutCirc,
}

impl Ease {
    pub fn apply(self, x: f32) -> f32 {
        let x = x.clamp(0.0, 1.0);
        match self {
            Ease::Linear => x,
            Ease::OutCirc => (1.0 - (x - 1.0).powi(2)).sqrt(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step<C> {
    Wait(f32),
    Tween {
        channel: Channel,
        from: f32,
        to: f32,
        secs: f32,
        ease: Ease,
    },
    Cue(C),
}

impl<C> Step<C> {
    pub fn fade(from: f32, to: f32, secs: f32) -> Self {
        Step::Tween {
            channel: Channel::Fade,
            from,
            to,
            secs,
            ease: Ease::Linear,
        }
    }
}

/// Everything that happened during one `advance` call.
#[derive(Debug)]
pub struct Frame<C> {
    pub cues: Vec<C>,
    pub samples: Vec<(Channel, f32)>,
    pub finished: bool,
}

impl<C> Default for Frame<C> {
    fn default() -> Self {
        Self {
            cues: Vec::new(),
            samples: Vec::new(),
            finished: false,
        }
    }
}

impl<C> Frame<C> {
    /// Last sample written to `channel` this frame.
    pub fn sample(&self, channel: Channel) -> Option<f32> {
        self.samples
            .iter()
            .rev()
            .find(|(c, _)| *c == channel)
            .map(|(_, v)| *v)
    }
}

#[derive(Debug, Clone)]
pub struct Timeline<C> {
    steps: VecDeque<Step<C>>,
    /// Time spent in the current front step.
    elapsed: f32,
}

impl<C> Timeline<C> {
    pub fn new(steps: impl IntoIterator<Item = Step<C>>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            elapsed: 0.0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.steps.is_empty()
    }

    /// Consume `dt` seconds, carrying leftover time into the following steps.
    pub fn advance(&mut self, dt: f32) -> Frame<C> {
        let mut budget = dt.max(0.0);
        let mut frame = Frame::default();

        while let Some(step) = self.steps.pop_front() {
            match step {
                Step::Cue(cue) => {
                    frame.cues.push(cue);
                    self.elapsed = 0.0;
                }
                Step::Wait(secs) => {
                    let remaining = secs - self.elapsed;
                    if budget < remaining {
                        self.elapsed += budget;
                        self.steps.push_front(Step::Wait(secs));
                        return frame;
                    }
                    budget -= remaining.max(0.0);
                    self.elapsed = 0.0;
                }
                Step::Tween {
                    channel,
                    from,
                    to,
                    secs,
                    ease,
                } => {
                    let remaining = secs - self.elapsed;
                    if budget < remaining {
                        self.elapsed += budget;
                        let t = self.elapsed / secs;
                        frame
                            .samples
                            .push((channel, from + (to - from) * ease.apply(t)));
                        self.steps.push_front(Step::Tween {
                            channel,
                            from,
                            to,
                            secs,
                            ease,
                        });
                        return frame;
                    }
                    budget -= remaining.max(0.0);
                    self.elapsed = 0.0;
                    frame.samples.push((channel, to));
                }
            }
        }

        frame.finished = true;
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Cue {
        Start,
        Middle,
        End,
    }

    #[test]
    fn cues_fire_in_order_with_waits_between() {
        let mut timeline = Timeline::new([
            Step::Cue(Cue::Start),
            Step::Wait(1.0),
            Step::Cue(Cue::Middle),
            Step::Wait(0.5),
            Step::Cue(Cue::End),
        ]);

        let frame = timeline.advance(0.0);
        assert_eq!(frame.cues, vec![Cue::Start]);
        assert!(!frame.finished);

        assert!(timeline.advance(0.9).cues.is_empty());

        let frame = timeline.advance(0.2);
        assert_eq!(frame.cues, vec![Cue::Middle]);

        // Leftover time from the long frame runs through the last wait.
        let frame = timeline.advance(5.0);
        assert_eq!(frame.cues, vec![Cue::End]);
        assert!(frame.finished);
        assert!(timeline.is_finished());
    }

    #[test]
    fn tween_samples_and_lands_on_end_value() {
        let mut timeline: Timeline<Cue> = Timeline::new([Step::fade(1.0, 0.0, 2.0)]);

        let frame = timeline.advance(0.5);
        let alpha = frame.sample(Channel::Fade).unwrap();
        assert!((alpha - 0.75).abs() < 1e-5);

        let frame = timeline.advance(10.0);
        assert_eq!(frame.sample(Channel::Fade), Some(0.0));
        assert!(frame.finished);
    }

    #[test]
    fn out_circ_front_loads_progress() {
        assert_eq!(Ease::OutCirc.apply(0.0), 0.0);
        assert!((Ease::OutCirc.apply(1.0) - 1.0).abs() < 1e-6);
        assert!(Ease::OutCirc.apply(0.25) > 0.25);
        assert_eq!(Ease::Linear.apply(1.5), 1.0);
    }

    #[test]
    fn camera_channel_is_separate_from_fade() {
        let mut timeline: Timeline<Cue> = Timeline::new([
            Step::fade(1.0, 0.0, 1.0),
            Step::Tween {
                channel: Channel::Camera,
                from: 0.0,
                to: 1.0,
                secs: 1.0,
                ease: Ease::Linear,
            },
        ]);

        let frame = timeline.advance(1.5);
        assert_eq!(frame.sample(Channel::Fade), Some(0.0));
        let progress = frame.sample(Channel::Camera).unwrap();
        assert!((progress - 0.5).abs() < 1e-5);
    }
}

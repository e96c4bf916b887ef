use rink::{ClientMessage, ControlAction, PaddleInput, Side, Snapshot};

use crate::net::{ClientSession, Driver, SessionEvent};

const SWEEP_MARGIN: f32 = 12.0;

/// Headless player: sweeps its paddle up and down while chasing the puck
/// horizontally. As host it starts the match once a guest is in.
pub struct SweepBot {
    top: f32,
    bottom: f32,
    moving_up: bool,
}

impl SweepBot {
    pub fn new(top: f32, bottom: f32) -> Self {
        Self {
            top,
            bottom,
            moving_up: true,
        }
    }

    fn steer(&mut self, side: Side, frame: &Snapshot) -> PaddleInput {
        let own = frame.paddle(side).position();
        if own.y <= self.top + SWEEP_MARGIN {
            self.moving_up = false;
        } else if own.y >= self.bottom - SWEEP_MARGIN {
            self.moving_up = true;
        }

        let puck_x = frame.puck.x;
        PaddleInput {
            up: self.moving_up,
            down: !self.moving_up,
            left: puck_x < own.x - SWEEP_MARGIN,
            right: puck_x > own.x + SWEEP_MARGIN,
        }
    }
}

impl Driver for SweepBot {
    fn on_event(
        &mut self,
        session: &ClientSession,
        event: &SessionEvent,
    ) -> Option<ClientMessage> {
        match event {
            SessionEvent::GuestJoined if !session.running() => session.control(ControlAction::Toggle),
            SessionEvent::ScoreChanged(scores) => {
                log::info!("score {} - {}", scores.left, scores.right);
                None
            }
            SessionEvent::StatusChanged(status) => {
                log::info!("status: {status}");
                None
            }
            SessionEvent::Latency { rtt_ms } => {
                log::debug!("rtt {rtt_ms:.0} ms");
                None
            }
            _ => None,
        }
    }

    fn on_frame(&mut self, session: &ClientSession, frame: Option<&Snapshot>) -> PaddleInput {
        match (session.side(), frame) {
            (Some(side), Some(frame)) if frame.running => self.steer(side, frame),
            _ => PaddleInput::NEUTRAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(paddle_y: f32, puck_x: f32) -> Snapshot {
        let mut frame = Snapshot {
            running: true,
            ..Snapshot::default()
        };
        frame.left.x = 140.0;
        frame.left.y = paddle_y;
        frame.puck.x = puck_x;
        frame
    }

    #[test]
    fn sweep_turns_at_the_edges() {
        let mut bot = SweepBot::new(40.0, 480.0);
        let input = bot.steer(Side::Left, &frame(45.0, 140.0));
        assert!(input.down && !input.up);

        let input = bot.steer(Side::Left, &frame(475.0, 140.0));
        assert!(input.up && !input.down);
    }

    #[test]
    fn chases_the_puck_horizontally() {
        let mut bot = SweepBot::new(40.0, 480.0);
        let input = bot.steer(Side::Left, &frame(260.0, 300.0));
        assert!(input.right && !input.left);

        let input = bot.steer(Side::Left, &frame(260.0, 60.0));
        assert!(input.left && !input.right);
    }
}

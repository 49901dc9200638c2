use super::{GateLogic, StateView};
use crate::common::{PortError, State};

/// Light-switch gate: passes its input through while switched on, drives
/// LOW otherwise.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Switch {
    clicked: bool,
}

impl Switch {
    pub fn is_clicked(&self) -> bool {
        self.clicked
    }

    pub fn set_clicked(&mut self, clicked: bool) {
        self.clicked = clicked;
    }
}

impl GateLogic for Switch {
    fn update(&mut self, io: &mut StateView<'_>) -> Result<(), PortError> {
        let state = if self.clicked {
            io.input_state(0)?
        } else {
            State::Low
        };

        io.set_output_state(0, state)
    }

    fn click_action(&mut self, _io: &mut StateView<'_>) -> Result<(), PortError> {
        self.clicked = !self.clicked;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::common::{GateId, State};
    use crate::gate::{Gate, GateType};

    fn update_with(gate: &mut Gate, input: State) -> eyre::Result<State> {
        gate.set_input_state(0, input)?;
        gate.update()?;
        Ok(gate.output_state(0)?)
    }

    #[test]
    fn unittest_switch_toggle_scenario() -> eyre::Result<()> {
        let mut gate = Gate::new(GateType::Switch, GateId(1));
        assert_eq!(gate.input_count(), 1);
        assert_eq!(gate.output_count(), 1);

        assert_eq!(gate.as_switch().map(|s| s.is_clicked()), Some(false));
        assert_eq!(update_with(&mut gate, State::High)?, State::Low);

        gate.click_action()?;
        assert_eq!(gate.as_switch().map(|s| s.is_clicked()), Some(true));
        assert_eq!(update_with(&mut gate, State::High)?, State::High);
        assert_eq!(update_with(&mut gate, State::Low)?, State::Low);

        gate.click_action()?;
        assert_eq!(gate.as_switch().map(|s| s.is_clicked()), Some(false));
        assert_eq!(update_with(&mut gate, State::High)?, State::Low);

        Ok(())
    }

    #[test]
    fn unittest_switch_output_is_not_latched() -> eyre::Result<()> {
        let mut gate = Gate::new(GateType::Switch, GateId(2));
        gate.set_input_state(0, State::High)?;
        gate.update()?;
        assert_eq!(gate.output_state(0)?, State::Low);

        // toggling alone does not move the output until the next update
        gate.click_action()?;
        assert_eq!(gate.output_state(0)?, State::Low);

        gate.update()?;
        assert_eq!(gate.output_state(0)?, State::High);

        Ok(())
    }

    #[test]
    fn unittest_switch_set_clicked() -> eyre::Result<()> {
        let mut gate = Gate::new(GateType::Switch, GateId(3));
        gate.set_input_state(0, State::High)?;

        if let Some(switch) = gate.as_switch_mut() {
            switch.set_clicked(true);
        }
        gate.update()?;
        assert_eq!(gate.output_state(0)?, State::High);

        if let Some(switch) = gate.as_switch_mut() {
            switch.set_clicked(false);
        }
        gate.update()?;
        assert_eq!(gate.output_state(0)?, State::Low);

        Ok(())
    }
}

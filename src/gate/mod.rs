use crate::common::{Connection, GateId, Port, PortError, PortSide, State, INITIAL_STATE};

pub mod kind;
pub mod logic;
pub mod switch;

pub use kind::GateType;
pub use logic::{Logic, LogicType};
pub use switch::Switch;

/// Behaviour every concrete gate implements. Both hooks only see port
/// states through [`StateView`]; connections are out of reach.
pub trait GateLogic {
    /// Recomputes the output states from the input states and the gate's own
    /// state.
    fn update(&mut self, io: &mut StateView<'_>) -> Result<(), PortError>;

    /// Reacts to an interactive trigger coming from the input layer.
    fn click_action(&mut self, _io: &mut StateView<'_>) -> Result<(), PortError> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PortSlot {
    pub state: State,
    pub connections: Vec<Connection>,
}

fn slot(slots: &[PortSlot], id: GateId, port: Port, side: PortSide) -> Result<&PortSlot, PortError> {
    slots.get(port).ok_or(PortError::new(id, port, side))
}

fn slot_mut(
    slots: &mut [PortSlot],
    id: GateId,
    port: Port,
    side: PortSide,
) -> Result<&mut PortSlot, PortError> {
    slots.get_mut(port).ok_or(PortError::new(id, port, side))
}

// update, click_action 에서만 사용하는 포트 상태 접근자
pub struct StateView<'a> {
    id: GateId,
    inputs: &'a [PortSlot],
    outputs: &'a mut [PortSlot],
}

impl<'a> StateView<'a> {
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn input_state(&self, port: Port) -> Result<State, PortError> {
        Ok(slot(self.inputs, self.id, port, PortSide::Input)?.state)
    }

    pub fn input_states(&self) -> impl Iterator<Item = State> + '_ {
        self.inputs.iter().map(|slot| slot.state)
    }

    pub fn output_state(&self, port: Port) -> Result<State, PortError> {
        Ok(slot(self.outputs, self.id, port, PortSide::Output)?.state)
    }

    pub fn set_output_state(&mut self, port: Port, state: State) -> Result<(), PortError> {
        slot_mut(self.outputs, self.id, port, PortSide::Output)?.state = state;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVariant {
    Switch(Switch),
    Logic(Logic),
}

impl GateVariant {
    pub fn new(gate_type: GateType) -> Self {
        match gate_type {
            GateType::Switch => GateVariant::Switch(Switch::default()),
            GateType::Not => GateVariant::Logic(Logic::new(LogicType::Not)),
            GateType::And => GateVariant::Logic(Logic::new(LogicType::And)),
            GateType::Or => GateVariant::Logic(Logic::new(LogicType::Or)),
            GateType::Xor => GateVariant::Logic(Logic::new(LogicType::Xor)),
        }
    }

    pub fn gate_type(&self) -> GateType {
        match self {
            GateVariant::Switch(_) => GateType::Switch,
            GateVariant::Logic(logic) => match logic.logic_type {
                LogicType::Not => GateType::Not,
                LogicType::And => GateType::And,
                LogicType::Or => GateType::Or,
                LogicType::Xor => GateType::Xor,
            },
        }
    }

    fn as_logic_mut(&mut self) -> &mut dyn GateLogic {
        match self {
            GateVariant::Switch(switch) => switch,
            GateVariant::Logic(logic) => logic,
        }
    }
}

/// A gate with fixed-size input and output port arrays.
///
/// Inputs hold at most one connection each, outputs fan out to any number of
/// distinct `(id, port)` pairs. Every indexed access is checked against the
/// array size and fails with [`PortError`] when out of range.
#[derive(Debug, Clone)]
pub struct Gate {
    id: GateId,
    variant: GateVariant,
    inputs: Vec<PortSlot>,
    outputs: Vec<PortSlot>,
}

impl Gate {
    pub fn new(gate_type: GateType, id: GateId) -> Self {
        let port = PortSlot {
            state: INITIAL_STATE,
            connections: Vec::new(),
        };

        Self {
            id,
            variant: GateVariant::new(gate_type),
            inputs: vec![port.clone(); gate_type.inputs_count()],
            outputs: vec![port; gate_type.outputs_count()],
        }
    }

    pub fn id(&self) -> GateId {
        self.id
    }

    pub fn gate_type(&self) -> GateType {
        self.variant.gate_type()
    }

    pub fn variant(&self) -> &GateVariant {
        &self.variant
    }

    pub fn as_switch(&self) -> Option<&Switch> {
        match &self.variant {
            GateVariant::Switch(switch) => Some(switch),
            _ => None,
        }
    }

    pub fn as_switch_mut(&mut self) -> Option<&mut Switch> {
        match &mut self.variant {
            GateVariant::Switch(switch) => Some(switch),
            _ => None,
        }
    }

    fn input(&self, port: Port) -> Result<&PortSlot, PortError> {
        slot(&self.inputs, self.id, port, PortSide::Input)
    }

    fn input_mut(&mut self, port: Port) -> Result<&mut PortSlot, PortError> {
        slot_mut(&mut self.inputs, self.id, port, PortSide::Input)
    }

    fn output(&self, port: Port) -> Result<&PortSlot, PortError> {
        slot(&self.outputs, self.id, port, PortSide::Output)
    }

    fn output_mut(&mut self, port: Port) -> Result<&mut PortSlot, PortError> {
        slot_mut(&mut self.outputs, self.id, port, PortSide::Output)
    }

    // ======
    // INPUTS
    // ======

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn inputs(&self) -> &[PortSlot] {
        &self.inputs
    }

    pub fn input_state(&self, port: Port) -> Result<State, PortError> {
        Ok(self.input(port)?.state)
    }

    pub fn set_input_state(&mut self, port: Port, state: State) -> Result<(), PortError> {
        self.input_mut(port)?.state = state;
        Ok(())
    }

    pub fn is_input_empty(&self, port: Port) -> Result<bool, PortError> {
        Ok(self.input(port)?.connections.is_empty())
    }

    pub fn is_input_connected_with(
        &self,
        port: Port,
        other_id: GateId,
        other_port: Port,
    ) -> Result<bool, PortError> {
        Ok(self
            .input(port)?
            .connections
            .contains(&Connection::new(other_id, other_port)))
    }

    pub fn input_connections(&self, port: Port) -> Result<&[Connection], PortError> {
        Ok(&self.input(port)?.connections)
    }

    /// Wires the input to `(other_id, other_port)`, replacing any existing
    /// driver in place.
    pub fn set_input_connection(
        &mut self,
        port: Port,
        other_id: GateId,
        other_port: Port,
    ) -> Result<(), PortError> {
        let connection = Connection::new(other_id, other_port);
        let slot = self.input_mut(port)?;

        match slot.connections.last_mut() {
            Some(current) => *current = connection,
            None => slot.connections.push(connection),
        }

        Ok(())
    }

    pub fn clear_input_connections(&mut self, port: Port) -> Result<(), PortError> {
        self.input_mut(port)?.connections.clear();
        Ok(())
    }

    // =======
    // OUTPUTS
    // =======

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn outputs(&self) -> &[PortSlot] {
        &self.outputs
    }

    pub fn output_state(&self, port: Port) -> Result<State, PortError> {
        Ok(self.output(port)?.state)
    }

    pub fn set_output_state(&mut self, port: Port, state: State) -> Result<(), PortError> {
        self.output_mut(port)?.state = state;
        Ok(())
    }

    pub fn is_output_empty(&self, port: Port) -> Result<bool, PortError> {
        Ok(self.output(port)?.connections.is_empty())
    }

    pub fn is_output_connected_with(
        &self,
        port: Port,
        other_id: GateId,
        other_port: Port,
    ) -> Result<bool, PortError> {
        Ok(self
            .output(port)?
            .connections
            .contains(&Connection::new(other_id, other_port)))
    }

    pub fn output_connections(&self, port: Port) -> Result<&[Connection], PortError> {
        Ok(&self.output(port)?.connections)
    }

    /// Adds a fan-out connection. Adding one that already exists is a no-op.
    pub fn add_output_connection(
        &mut self,
        port: Port,
        other_id: GateId,
        other_port: Port,
    ) -> Result<(), PortError> {
        let id = self.id;
        let connection = Connection::new(other_id, other_port);
        let slot = self.output_mut(port)?;

        if slot.connections.contains(&connection) {
            tracing::trace!("connect abort, {id}:{port} already wired to {connection:?}");
            return Ok(());
        }

        slot.connections.push(connection);
        Ok(())
    }

    /// Removes a fan-out connection. Removing one that is absent is a no-op.
    pub fn remove_output_connection(
        &mut self,
        port: Port,
        other_id: GateId,
        other_port: Port,
    ) -> Result<(), PortError> {
        let id = self.id;
        let connection = Connection::new(other_id, other_port);
        let slot = self.output_mut(port)?;

        let Some(index) = slot.connections.iter().position(|c| *c == connection) else {
            tracing::trace!("disconnect abort, {id}:{port} not wired to {connection:?}");
            return Ok(());
        };

        slot.connections.remove(index);
        Ok(())
    }

    pub fn clear_output_connections(&mut self, port: Port) -> Result<(), PortError> {
        self.output_mut(port)?.connections.clear();
        Ok(())
    }

    // =======
    // GENERAL
    // =======

    pub fn reset(&mut self) {
        self.inputs
            .iter_mut()
            .chain(self.outputs.iter_mut())
            .for_each(|slot| slot.state = INITIAL_STATE);
    }

    pub fn clear(&mut self) {
        self.inputs
            .iter_mut()
            .chain(self.outputs.iter_mut())
            .for_each(|slot| slot.connections.clear());
    }

    pub fn update(&mut self) -> Result<(), PortError> {
        let mut io = StateView {
            id: self.id,
            inputs: &self.inputs,
            outputs: &mut self.outputs,
        };

        self.variant.as_logic_mut().update(&mut io)
    }

    pub fn click_action(&mut self) -> Result<(), PortError> {
        let mut io = StateView {
            id: self.id,
            inputs: &self.inputs,
            outputs: &mut self.outputs,
        };

        self.variant.as_logic_mut().click_action(&mut io)
    }
}

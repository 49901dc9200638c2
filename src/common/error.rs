use super::{GateId, Port, PortSide};

/// Raised when a port index is outside `[0, count)` of the accessed side.
#[derive(Debug, Copy, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("gate {id}: {side} port {port} is out of range")]
pub struct PortError {
    pub id: GateId,
    pub port: Port,
    pub side: PortSide,
}

impl PortError {
    pub fn new(id: GateId, port: Port, side: PortSide) -> Self {
        Self { id, port, side }
    }

    pub fn is_input(&self) -> bool {
        matches!(self.side, PortSide::Input)
    }
}

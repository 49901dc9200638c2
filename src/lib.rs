//! Gate-level digital logic simulation.
//!
//! [`gate::Gate`] owns fixed-size input and output port arrays and enforces
//! the wiring rules: one driver per input, any number of distinct fan-out
//! connections per output, bounds-checked port indices. Concrete behaviour
//! (switches, combinational logic) plugs in through [`gate::GateLogic`].
//! [`circuit::Circuit`] is a reference driver that owns gates by id, wires
//! them and propagates state changes.

pub mod circuit;
pub mod common;
pub mod gate;

pub use circuit::{Circuit, CircuitConfig};
pub use common::{Connection, GateId, Port, PortError, PortSide, State, INITIAL_STATE};
pub use gate::{Gate, GateLogic, GateType, Switch};

use std::collections::{BTreeMap, HashMap, VecDeque};

use eyre::ContextCompat;
use itertools::Itertools;
use petgraph::stable_graph::NodeIndex;

use crate::common::{Connection, GateId, Port, State, INITIAL_STATE};
use crate::gate::{Gate, GateType};

pub mod config;

pub use config::CircuitConfig;

/// Arena of gates indexed by id. Resolves the `(id, port)` connections the
/// gates store and decides when each gate is updated.
#[derive(Debug, Default, Clone, derive_more::Deref)]
pub struct Circuit {
    config: CircuitConfig,
    #[deref]
    gates: BTreeMap<GateId, Gate>,
    next_id: usize,
}

impl Circuit {
    pub fn new(config: CircuitConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    pub fn add_gate(&mut self, gate_type: GateType) -> GateId {
        let id = GateId(self.next_id);
        self.next_id += 1;

        tracing::debug!("add gate {id}: {gate_type}");
        self.gates.insert(id, Gate::new(gate_type, id));
        id
    }

    pub fn gate(&self, id: GateId) -> eyre::Result<&Gate> {
        self.gates
            .get(&id)
            .with_context(|| format!("gate {id} does not exist"))
    }

    pub fn gate_mut(&mut self, id: GateId) -> eyre::Result<&mut Gate> {
        self.gates
            .get_mut(&id)
            .with_context(|| format!("gate {id} does not exist"))
    }

    /// Detaches the gate from every peer and takes it out of the circuit.
    /// Peer ports that are out of range are skipped the same way as missing
    /// peers.
    pub fn remove_gate(&mut self, id: GateId) -> eyre::Result<Gate> {
        let gate = self.gate(id)?;
        let sources = gate
            .inputs()
            .iter()
            .enumerate()
            .flat_map(|(port, input)| input.connections.iter().map(move |c| (*c, port)))
            .collect_vec();
        let targets = gate
            .outputs()
            .iter()
            .enumerate()
            .flat_map(|(port, output)| output.connections.iter().map(move |c| (*c, port)))
            .collect_vec();

        for (source, port) in sources {
            let Some(peer) = self.gates.get_mut(&source.id) else {
                continue;
            };

            if let Err(err) = peer.remove_output_connection(source.port, id, port) {
                tracing::warn!("skip detaching {id}:{port} from its source, {err}");
            }
        }

        for (target, port) in targets {
            let Some(peer) = self.gates.get_mut(&target.id) else {
                continue;
            };

            match peer.is_input_connected_with(target.port, id, port) {
                Ok(true) => {
                    peer.clear_input_connections(target.port)?;
                    peer.set_input_state(target.port, INITIAL_STATE)?;
                }
                Ok(false) => (),
                Err(err) => tracing::warn!("skip detaching {id}:{port} from its target, {err}"),
            }
        }

        let mut gate = self
            .gates
            .remove(&id)
            .with_context(|| format!("gate {id} does not exist"))?;

        tracing::debug!("remove gate {id}");
        gate.clear();
        Ok(gate)
    }

    /// Wires `src` output `out` to `dst` input `inp`. A previous driver of the
    /// input loses its fan-out entry. The current output state is carried
    /// over to the input; no gate is updated.
    pub fn connect(&mut self, src: GateId, out: Port, dst: GateId, inp: Port) -> eyre::Result<()> {
        let state = self.gate(src)?.output_state(out)?;
        let previous = self.gate(dst)?.input_connections(inp)?.first().copied();

        if let Some(previous) = previous {
            if previous == Connection::new(src, out) {
                tracing::trace!("connect abort, {src}:{out} already drives {dst}:{inp}");
                return Ok(());
            }

            if let Some(peer) = self.gates.get_mut(&previous.id) {
                peer.remove_output_connection(previous.port, dst, inp)?;
            }
        }

        let target = self.gate_mut(dst)?;
        target.set_input_connection(inp, src, out)?;
        target.set_input_state(inp, state)?;
        self.gate_mut(src)?.add_output_connection(out, dst, inp)?;

        tracing::debug!("connect {src}:{out} -> {dst}:{inp}");
        Ok(())
    }

    /// Removes the wire between `src` output `out` and `dst` input `inp`, if
    /// present. The freed input falls back to the initial state.
    pub fn disconnect(&mut self, src: GateId, out: Port, dst: GateId, inp: Port) -> eyre::Result<()> {
        self.gate_mut(src)?.remove_output_connection(out, dst, inp)?;

        let target = self.gate_mut(dst)?;
        if target.is_input_connected_with(inp, src, out)? {
            target.clear_input_connections(inp)?;
            target.set_input_state(inp, INITIAL_STATE)?;
            tracing::debug!("disconnect {src}:{out} -> {dst}:{inp}");
        }

        Ok(())
    }

    /// Routes a click to the gate, then propagates whatever changed.
    pub fn click(&mut self, id: GateId) -> eyre::Result<usize> {
        tracing::debug!("click gate {id}");
        self.gate_mut(id)?.click_action()?;
        self.propagate([id])
    }

    pub fn reset(&mut self) {
        self.gates.values_mut().for_each(Gate::reset);
    }

    pub fn clear(&mut self) {
        self.gates.values_mut().for_each(Gate::clear);
    }

    /// Re-evaluates every gate until no output changes. Gates are visited in
    /// topological order when the circuit has no feedback loop.
    pub fn settle(&mut self) -> eyre::Result<usize> {
        let order = match self.topological_order() {
            Ok(order) => order,
            Err(err) => {
                tracing::debug!("{err}, settling in id order");
                self.gates.keys().copied().collect_vec()
            }
        };

        let deliveries = self
            .gates
            .values()
            .flat_map(|gate| {
                gate.outputs().iter().flat_map(|output| {
                    output
                        .connections
                        .iter()
                        .map(move |connection| (*connection, output.state))
                })
            })
            .collect_vec();
        self.deliver(deliveries)?;

        self.propagate(order)
    }

    /// Event-driven propagation starting from `seeds`. Each tick updates the
    /// queued gates and copies changed outputs into the connected inputs;
    /// gates fed by a change are queued for the next tick. Returns the number
    /// of ticks until the circuit went quiet.
    pub fn propagate(&mut self, seeds: impl IntoIterator<Item = GateId>) -> eyre::Result<usize> {
        let mut queue: VecDeque<GateId> = seeds.into_iter().collect();
        let mut tick = 0;

        while !queue.is_empty() {
            if tick >= self.config.max_ticks {
                tracing::warn!("propagation stopped, {} gates pending", queue.len());

                if let Err(err) = self.topological_order() {
                    eyre::bail!(
                        "circuit did not settle within {} ticks, {err}",
                        self.config.max_ticks
                    );
                }

                eyre::bail!(
                    "propagation depth exceeded {} ticks in an acyclic circuit",
                    self.config.max_ticks
                );
            }

            let mut next = VecDeque::new();

            for id in std::mem::take(&mut queue).into_iter().unique() {
                let Some(gate) = self.gates.get_mut(&id) else {
                    continue;
                };

                let before = gate.outputs().iter().map(|output| output.state).collect_vec();
                gate.update()?;

                let deliveries = gate
                    .outputs()
                    .iter()
                    .zip(before)
                    .filter(|(output, state)| output.state != *state)
                    .flat_map(|(output, _)| {
                        output
                            .connections
                            .iter()
                            .map(move |connection| (*connection, output.state))
                    })
                    .collect_vec();

                next.extend(self.deliver(deliveries)?);
            }

            tick += 1;
            tracing::debug!("propagate tick {tick}, {} gates queued", next.len());
            queue = next;
        }

        Ok(tick)
    }

    // 연결된 입력에 상태를 전달하고 값이 바뀐 게이트를 돌려준다
    fn deliver(&mut self, deliveries: Vec<(Connection, State)>) -> eyre::Result<Vec<GateId>> {
        let mut touched = Vec::new();

        for (connection, state) in deliveries {
            let Some(target) = self.gates.get_mut(&connection.id) else {
                continue;
            };

            match target.input_state(connection.port) {
                Ok(current) if current != state => {
                    target.set_input_state(connection.port, state)?;
                    touched.push(connection.id);
                }
                Ok(_) => (),
                Err(err) => tracing::warn!("skip delivering to {connection:?}, {err}"),
            }
        }

        Ok(touched)
    }

    /// Exports the wiring, one edge per connection labelled `(out, inp)`.
    pub fn to_petgraph(&self) -> petgraph::Graph<GateId, (Port, Port)> {
        let mut graph = petgraph::Graph::new();
        let nodes: HashMap<GateId, NodeIndex> = self
            .gates
            .keys()
            .map(|id| (*id, graph.add_node(*id)))
            .collect();

        for gate in self.gates.values() {
            for (port, output) in gate.outputs().iter().enumerate() {
                for connection in &output.connections {
                    if let Some(target) = nodes.get(&connection.id) {
                        graph.add_edge(nodes[&gate.id()], *target, (port, connection.port));
                    }
                }
            }
        }

        graph
    }

    pub fn topological_order(&self) -> eyre::Result<Vec<GateId>> {
        let graph = self.to_petgraph();

        petgraph::algo::toposort(&graph, None)
            .map(|order| order.into_iter().map(|index| graph[index]).collect())
            .map_err(|cycle| eyre::eyre!("feedback loop through gate {}", graph[cycle.node_id()]))
    }
}

#[cfg(test)]
mod tests {
    use super::{Circuit, CircuitConfig};
    use crate::common::{Connection, GateId, State};
    use crate::gate::GateType;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    // s0, s1 -> and -> not
    fn and_not_circuit() -> eyre::Result<(Circuit, [GateId; 4])> {
        let mut circuit = Circuit::default();
        let s0 = circuit.add_gate(GateType::Switch);
        let s1 = circuit.add_gate(GateType::Switch);
        let and = circuit.add_gate(GateType::And);
        let not = circuit.add_gate(GateType::Not);

        circuit.connect(s0, 0, and, 0)?;
        circuit.connect(s1, 0, and, 1)?;
        circuit.connect(and, 0, not, 0)?;

        circuit.gate_mut(s0)?.set_input_state(0, State::High)?;
        circuit.gate_mut(s1)?.set_input_state(0, State::High)?;

        Ok((circuit, [s0, s1, and, not]))
    }

    #[test]
    fn unittest_circuit_ids_are_not_reused() -> eyre::Result<()> {
        let mut circuit = Circuit::default();
        let a = circuit.add_gate(GateType::Not);
        circuit.remove_gate(a)?;
        let b = circuit.add_gate(GateType::Not);

        assert_ne!(a, b);
        assert!(circuit.gate(a).is_err());
        assert_eq!(circuit.len(), 1);

        Ok(())
    }

    #[test]
    fn unittest_circuit_click_propagation() -> eyre::Result<()> {
        init_tracing();

        let (mut circuit, [s0, s1, and, not]) = and_not_circuit()?;
        assert_eq!(circuit.topological_order()?.len(), 4);

        circuit.settle()?;
        assert_eq!(circuit.gate(and)?.output_state(0)?, State::Low);
        assert_eq!(circuit.gate(not)?.output_state(0)?, State::High);

        circuit.click(s0)?;
        assert_eq!(circuit.gate(and)?.output_state(0)?, State::Low);

        circuit.click(s1)?;
        assert_eq!(circuit.gate(and)?.input_state(1)?, State::High);
        assert_eq!(circuit.gate(and)?.output_state(0)?, State::High);
        assert_eq!(circuit.gate(not)?.output_state(0)?, State::Low);

        circuit.click(s0)?;
        assert_eq!(circuit.gate(not)?.output_state(0)?, State::High);

        Ok(())
    }

    #[test]
    fn unittest_circuit_reset_keeps_wiring() -> eyre::Result<()> {
        let (mut circuit, [s0, s1, and, not]) = and_not_circuit()?;
        circuit.click(s0)?;
        circuit.click(s1)?;
        assert_eq!(circuit.gate(and)?.output_state(0)?, State::High);

        circuit.reset();
        assert_eq!(circuit.gate(and)?.output_state(0)?, State::Low);
        assert_eq!(circuit.gate(s0)?.input_state(0)?, State::Low);
        assert!(circuit.gate(and)?.is_output_connected_with(0, not, 0)?);

        circuit.clear();
        assert!(circuit.gate(and)?.is_output_empty(0)?);
        assert!(circuit.gate(not)?.is_input_empty(0)?);

        Ok(())
    }

    #[test]
    fn unittest_circuit_rewire_single_driver() -> eyre::Result<()> {
        let (mut circuit, [s0, s1, and, _]) = and_not_circuit()?;

        // s1 takes over and:0, s0 loses its fan-out entry
        circuit.connect(s1, 0, and, 0)?;
        assert_eq!(circuit.gate(and)?.input_connections(0)?, &[Connection::new(s1, 0)]);
        assert!(circuit.gate(s0)?.is_output_empty(0)?);
        assert_eq!(circuit.gate(s1)?.output_connections(0)?.len(), 2);

        // redundant wiring is a no-op
        circuit.connect(s1, 0, and, 0)?;
        assert_eq!(circuit.gate(s1)?.output_connections(0)?.len(), 2);

        circuit.disconnect(s1, 0, and, 0)?;
        circuit.disconnect(s1, 0, and, 0)?;
        assert!(circuit.gate(and)?.is_input_empty(0)?);
        assert_eq!(circuit.gate(s1)?.output_connections(0)?, &[Connection::new(and, 1)]);

        Ok(())
    }

    #[test]
    fn unittest_circuit_remove_gate_detaches_peers() -> eyre::Result<()> {
        let (mut circuit, [s0, s1, and, not]) = and_not_circuit()?;

        let removed = circuit.remove_gate(and)?;
        assert_eq!(removed.gate_type(), GateType::And);
        assert!(removed.is_input_empty(0)?);
        assert!(circuit.gate(s0)?.is_output_empty(0)?);
        assert!(circuit.gate(s1)?.is_output_empty(0)?);
        assert!(circuit.gate(not)?.is_input_empty(0)?);

        Ok(())
    }

    #[test]
    fn unittest_circuit_invalid_wiring() -> eyre::Result<()> {
        let (mut circuit, [s0, _, and, _]) = and_not_circuit()?;

        assert!(circuit.connect(s0, 1, and, 0).is_err());
        assert!(circuit.connect(s0, 0, and, 2).is_err());
        assert!(circuit.connect(s0, 0, GateId(99), 0).is_err());
        assert!(circuit.click(GateId(99)).is_err());

        Ok(())
    }

    #[test]
    fn unittest_circuit_oscillation_is_bounded() -> eyre::Result<()> {
        init_tracing();

        let mut circuit = Circuit::new(CircuitConfig { max_ticks: 16 });
        let not = circuit.add_gate(GateType::Not);
        circuit.connect(not, 0, not, 0)?;

        assert!(circuit.topological_order().is_err());

        let err = circuit.settle().err().map(|err| err.to_string());
        assert!(err.is_some_and(|err| err.contains("feedback loop")));

        Ok(())
    }

    #[test]
    fn unittest_circuit_depth_budget_in_acyclic_chain() -> eyre::Result<()> {
        let mut circuit = Circuit::new(CircuitConfig { max_ticks: 2 });
        let switch = circuit.add_gate(GateType::Switch);
        let not0 = circuit.add_gate(GateType::Not);
        let not1 = circuit.add_gate(GateType::Not);
        let not2 = circuit.add_gate(GateType::Not);

        circuit.connect(switch, 0, not0, 0)?;
        circuit.connect(not0, 0, not1, 0)?;
        circuit.connect(not1, 0, not2, 0)?;
        circuit.gate_mut(switch)?.set_input_state(0, State::High)?;
        circuit.settle()?;

        let err = circuit.click(switch).err().map(|err| err.to_string());
        assert!(err.is_some_and(|err| err.contains("depth")));

        Ok(())
    }

    #[test]
    fn unittest_circuit_dangling_peer_port() -> eyre::Result<()> {
        init_tracing();

        let mut circuit = Circuit::default();
        let a = circuit.add_gate(GateType::Not);
        let b = circuit.add_gate(GateType::Not);
        circuit.connect(a, 0, b, 0)?;
        circuit.gate_mut(a)?.add_output_connection(0, b, 7)?;

        circuit.settle()?;
        assert_eq!(circuit.gate(b)?.input_state(0)?, State::High);
        assert_eq!(circuit.gate(b)?.output_state(0)?, State::Low);

        let removed = circuit.remove_gate(a)?;
        assert_eq!(removed.id(), a);
        assert!(removed.is_output_empty(0)?);
        assert!(circuit.gate(a).is_err());
        assert!(circuit.gate(b)?.is_input_empty(0)?);
        assert_eq!(circuit.gate(b)?.input_state(0)?, State::Low);

        Ok(())
    }

    #[test]
    fn unittest_circuit_dangling_source_port() -> eyre::Result<()> {
        let mut circuit = Circuit::default();
        let a = circuit.add_gate(GateType::Not);
        let b = circuit.add_gate(GateType::Not);
        circuit.gate_mut(b)?.set_input_connection(0, a, 3)?;

        let removed = circuit.remove_gate(b)?;
        assert!(removed.is_input_empty(0)?);
        assert!(circuit.gate(a).is_ok());

        Ok(())
    }
}

use super::{GateLogic, StateView};
use crate::common::{PortError, State};

#[derive(Debug, Copy, Clone, PartialEq, Eq, strum_macros::Display)]
pub enum LogicType {
    Not,
    And,
    Or,
    Xor,
}

// 조합 논리 게이트, 내부 상태 없이 입력만으로 출력을 계산한다
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Logic {
    pub logic_type: LogicType,
}

impl Logic {
    pub fn new(logic_type: LogicType) -> Self {
        Self { logic_type }
    }
}

impl GateLogic for Logic {
    fn update(&mut self, io: &mut StateView<'_>) -> Result<(), PortError> {
        let state = match self.logic_type {
            LogicType::Not => !io.input_state(0)?,
            LogicType::And => io.input_states().all(|s| s.is_high()).into(),
            LogicType::Or => io.input_states().any(|s| s.is_high()).into(),
            LogicType::Xor => (io.input_states().filter(State::is_high).count() % 2 == 1).into(),
        };

        io.set_output_state(0, state)
    }
}

use strum::EnumCount;

// 게이트의 종류, 포트 개수는 종류에 의해서만 결정된다
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumCount,
    strum_macros::EnumIter,
)]
pub enum GateType {
    Switch,
    Not,
    And,
    Or,
    Xor,
}

const GATE_INPUTS_COUNT: [usize; GateType::COUNT] = [1, 1, 2, 2, 2];
const GATE_OUTPUTS_COUNT: [usize; GateType::COUNT] = [1, 1, 1, 1, 1];

impl GateType {
    pub fn inputs_count(&self) -> usize {
        GATE_INPUTS_COUNT[*self as usize]
    }

    pub fn outputs_count(&self) -> usize {
        GATE_OUTPUTS_COUNT[*self as usize]
    }
}

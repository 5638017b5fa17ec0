use crate::mode::Field;
use crate::model::LPC_ORD;

/// The transmitted parameters of one frame, as field values
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct QuantizedFrame {
    pub voiced: [bool; 4],
    pub woe: [usize; 2],
    pub lsp: [usize; LPC_ORD],
    pub spare: usize,
}

impl QuantizedFrame {
    pub fn get(&self, field: Field) -> usize {
        match field {
            Field::Voicing(i) => self.voiced[i] as usize,
            Field::WoE(i) => self.woe[i],
            Field::Lsp(i) => self.lsp[i],
            Field::Spare => self.spare,
        }
    }

    pub fn set(&mut self, field: Field, value: usize) {
        match field {
            Field::Voicing(i) => self.voiced[i] = value != 0,
            Field::WoE(i) => self.woe[i] = value,
            Field::Lsp(i) => self.lsp[i] = value,
            Field::Spare => self.spare = value,
        }
    }
}

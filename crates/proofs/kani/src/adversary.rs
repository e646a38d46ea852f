//! Adversarial step generator

#[cfg(kani)]
use kani::any;
#[cfg(kani)]
use model_safety::{state::*, transitions::*};

#[derive(Clone, Copy)]
pub enum Step {
    Commit,
    Withdraw,
    TriggerOne,
    TriggerTwo,
}

#[cfg(kani)]
impl kani::Arbitrary for Step {
    fn any() -> Self {
        let choice: u8 = any();
        match choice % 4 {
            0 => Step::Commit,
            1 => Step::Withdraw,
            2 => Step::TriggerOne,
            _ => Step::TriggerTwo,
        }
    }
}

#[cfg(kani)]
pub fn adversary_step(s: State) -> State {
    use crate::generators::{any_level, any_size};

    match any::<Step>() {
        Step::Commit => commit(s, any_level(), any_size()),
        Step::Withdraw => {
            let id: usize = (any::<u8>() as usize) % MAX_REFS;
            withdraw(s, id)
        }
        Step::TriggerOne => {
            let level = any_level();
            trigger(s, &[level])
        }
        Step::TriggerTwo => {
            let a = any_level();
            let b = any_level();
            trigger(s, &[a, b])
        }
    }
}

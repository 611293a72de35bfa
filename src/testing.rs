//! Test helpers shared by the action and mapper tests

use crate::actions::{Action, ExecutionContext, Speed};
use std::cell::RefCell;
use std::rc::Rc;

/// A call observed by a probe action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Press(&'static str),
    Release(&'static str),
}

/// Shared, ordered record of probe calls
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }
}

/// Action that records its edges instead of touching the device
#[derive(Debug)]
pub struct Probe {
    name: &'static str,
    log: CallLog,
    speed: Option<Speed>,
}

pub fn probe(log: &CallLog, name: &'static str) -> Box<dyn Action> {
    Box::new(Probe {
        name,
        log: log.clone(),
        speed: None,
    })
}

impl Action for Probe {
    fn press(&mut self, _ctx: &mut dyn ExecutionContext) -> bool {
        self.log.push(Call::Press(self.name));
        true
    }

    fn release(&mut self, _ctx: &mut dyn ExecutionContext) {
        self.log.push(Call::Release(self.name));
    }

    fn describe(&self) -> String {
        self.name.to_string()
    }

    fn serialize(&self) -> String {
        format!("probe({})", self.name)
    }

    fn set_speed(&mut self, speed: Speed) -> bool {
        self.speed = Some(speed);
        true
    }

    fn get_speed(&self) -> Option<Speed> {
        self.speed
    }
}

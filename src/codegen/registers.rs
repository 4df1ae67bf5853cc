use std::collections::HashMap;

use tracing::trace;

use crate::typeck::env::MethodInfo;

/// Variable-to-slot assignment for one method activation.
///
/// Layout: `this` (instance methods), parameters in order (a vararg
/// parameter is the last of them), locals in order, then temporaries.
/// Slots are never reused.
#[derive(Debug, Clone)]
pub struct RegisterMap {
    slots: HashMap<String, u16>,
    declared: u16,
    next: u16,
}

impl RegisterMap {
    pub fn for_method(method: &MethodInfo) -> Self {
        let mut map = RegisterMap { slots: HashMap::new(), declared: 0, next: 0 };
        if !method.is_static {
            map.bind("this");
        }
        for param in &method.params {
            map.bind(&param.name);
        }
        if is_entry_point(method) && method.params.is_empty() {
            // The JVM still passes `String[] args` in slot 0.
            map.next += 1;
        }
        for local in &method.locals {
            map.bind(&local.name);
        }
        map.declared = map.next;
        map
    }

    fn bind(&mut self, name: &str) {
        self.slots.entry(name.to_string()).or_insert(self.next);
        self.next += 1;
    }

    pub fn slot(&self, name: &str) -> Option<u16> {
        self.slots.get(name).copied()
    }

    /// Reserve `n` consecutive fresh slots and return the first.
    pub fn alloc_temps(&mut self, n: u16) -> u16 {
        let first = self.next;
        self.next += n;
        trace!(first, count = n, "allocated temporary slots");
        first
    }

    /// Slots taken by `this`, parameters and locals.
    pub fn declared(&self) -> u16 {
        self.declared
    }

    /// Total slots handed out so far, temporaries included.
    pub fn allocated(&self) -> u16 {
        self.next
    }
}

/// `public static void main(String[] args)`.
pub fn is_entry_point(method: &MethodInfo) -> bool {
    method.name == "main" && method.is_static
}

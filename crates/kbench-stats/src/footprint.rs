//! Resource footprint and instance-density projection.
//!
//! Sums the declared requests of every instance, averages per instance,
//! and asks how many such instances fit in a node budget. CPU and memory
//! are projected independently; the smaller count binds.

use serde::Serialize;

use kbench_core::config::FootprintConfig;
use kbench_core::{DeclaredInstance, QuantityError, parse_cpu_millis, parse_memory_mib};

/// Aggregated declared resources of one service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Footprint {
    pub instances: usize,
    pub total_cpu_millis: u64,
    pub total_memory_mib: f64,
    pub avg_cpu_millis: f64,
    pub avg_memory_mib: f64,
}

/// Which resource limits the projected density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Constraint {
    Cpu,
    Memory,
}

/// Instances that fit in the budget, per resource and overall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Density {
    /// `None` when no CPU is declared.
    pub by_cpu: Option<u64>,
    /// `None` when no memory is declared.
    pub by_memory: Option<u64>,
    pub binding: Option<u64>,
    pub constraint: Option<Constraint>,
}

/// Sum and average the declared requests of `declared`.
pub fn measure_footprint(declared: &[DeclaredInstance]) -> Result<Footprint, QuantityError> {
    let mut total_cpu_millis = 0u64;
    let mut total_memory_mib = 0.0f64;

    for instance in declared {
        for cpu in &instance.cpu_requests {
            total_cpu_millis = total_cpu_millis
                .checked_add(parse_cpu_millis(cpu)?)
                .ok_or_else(|| QuantityError::OutOfRange(format!("total of {cpu}")))?;
        }
        for memory in &instance.memory_requests {
            total_memory_mib += parse_memory_mib(memory)?;
        }
    }

    let instances = declared.len();
    let (avg_cpu_millis, avg_memory_mib) = if instances == 0 {
        (0.0, 0.0)
    } else {
        (
            total_cpu_millis as f64 / instances as f64,
            total_memory_mib / instances as f64,
        )
    };

    Ok(Footprint {
        instances,
        total_cpu_millis,
        total_memory_mib,
        avg_cpu_millis,
        avg_memory_mib,
    })
}

/// Project how many average instances fit in `budget`.
pub fn project_density(footprint: &Footprint, budget: &FootprintConfig) -> Density {
    let by_cpu = fit(budget.cpu_budget_millis as f64, footprint.avg_cpu_millis);
    let by_memory = fit(budget.memory_budget_mib as f64, footprint.avg_memory_mib);

    let (binding, constraint) = match (by_cpu, by_memory) {
        (Some(c), Some(m)) if c <= m => (Some(c), Some(Constraint::Cpu)),
        (Some(_), Some(m)) => (Some(m), Some(Constraint::Memory)),
        (Some(c), None) => (Some(c), Some(Constraint::Cpu)),
        (None, Some(m)) => (Some(m), Some(Constraint::Memory)),
        (None, None) => (None, None),
    };

    Density {
        by_cpu,
        by_memory,
        binding,
        constraint,
    }
}

fn fit(budget: f64, per_instance: f64) -> Option<u64> {
    if per_instance <= 0.0 {
        return None;
    }
    Some((budget / per_instance).floor() as u64)
}

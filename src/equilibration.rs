/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Equilibration statistics gatherers (C8, §4.8).

When the driver is running in an equilibration mode rather than a
compression mode, termination is decided by a chain of gatherers
consulted after every cycle, grounded on the
`PostProcessing/Headers/IEquilibrationStatisticsGatherer.h` family:
[`MinIterationsProcessor`], [`EquilibrationPressureProcessor`],
[`ErrorRateProcessor`], and a bookkeeping-only
[`ScatterAndDiffusionProcessor`] stand-in. Only the headers for these
survive in the retrieval pack — the bodies below follow the documented
field layout (ring buffers sized by `averagingWindowWidth`, a
`minIterationsCount` counter) with the exact comparison thresholds settled
as Open Question decisions (§4.8).

*/

use crate::particle::Packing;
use crate::utils::circular_buffer::CircularBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquilibrationStatus {
    ErrorsFound,
    NotEnoughStatistics,
    EnoughStatistics,
}

/// The subset of cycle statistics a gatherer needs to look at; decoupled
/// from [`crate::scheduler::CycleStats`] so gatherers don't depend on the
/// scheduler module.
#[derive(Debug, Clone, Copy)]
pub struct CycleReport {
    pub reduced_pressure: f64,
    pub collision_errors_existed: bool,
}

pub trait EquilibrationGatherer {
    fn start(&mut self);
    fn process_step(&mut self, particles: &Packing, report: &CycleReport) -> EquilibrationStatus;
}

/// Requires at least `min_iterations_count` cycles before declaring
/// anything else's job done. Grounded on `MinIterationsProcessor.h`.
#[derive(Debug)]
pub struct MinIterationsProcessor {
    min_iterations_count: u32,
    iteration_index: u32,
}

impl MinIterationsProcessor {
    pub fn new(min_iterations_count: u32) -> Self {
        MinIterationsProcessor { min_iterations_count, iteration_index: 0 }
    }
}

impl EquilibrationGatherer for MinIterationsProcessor {
    fn start(&mut self) {
        self.iteration_index = 0;
    }

    fn process_step(&mut self, _particles: &Packing, _report: &CycleReport) -> EquilibrationStatus {
        self.iteration_index += 1;
        if self.iteration_index < self.min_iterations_count {
            EquilibrationStatus::NotEnoughStatistics
        } else {
            EquilibrationStatus::EnoughStatistics
        }
    }
}

/// Declares the pressure equilibrated once the mean of the last `window`
/// cycles differs from the mean of the `window` before it by less than
/// `max_relative_change` (default `0.05`). Grounded on
/// `EquilibrationPressureProcessor.h`; a ring buffer twice `window` wide
/// lets "the two halves" be read without shifting anything.
#[derive(Debug)]
pub struct EquilibrationPressureProcessor {
    window: usize,
    max_relative_change: f64,
    pressures: CircularBuffer<f64>,
    iteration_index: usize,
}

impl EquilibrationPressureProcessor {
    pub fn new(window: usize) -> Self {
        EquilibrationPressureProcessor {
            window,
            max_relative_change: 0.05,
            pressures: CircularBuffer::new(2 * window),
            iteration_index: 0,
        }
    }

    fn half_average(&self, first_index: usize) -> f64 {
        let mut sum = 0.0;
        for offset in 0..self.window {
            sum += self.pressures[first_index + offset];
        }
        sum / self.window as f64
    }
}

impl EquilibrationGatherer for EquilibrationPressureProcessor {
    fn start(&mut self) {
        self.iteration_index = 0;
        self.pressures = CircularBuffer::new(2 * self.window);
    }

    fn process_step(&mut self, _particles: &Packing, report: &CycleReport) -> EquilibrationStatus {
        self.pressures.replace(self.iteration_index, report.reduced_pressure);
        self.iteration_index += 1;

        if self.iteration_index < 2 * self.window {
            return EquilibrationStatus::NotEnoughStatistics;
        }

        let last_inclusive = self.iteration_index - 1;
        let current_half_start = last_inclusive + 1 - self.window;
        let previous_half_start = current_half_start - self.window;

        let current_average = self.half_average(current_half_start);
        let previous_average = self.half_average(previous_half_start);

        let relative_change = if current_average == 0.0 { 0.0 } else { ((current_average - previous_average) / current_average).abs() };

        if relative_change < self.max_relative_change {
            EquilibrationStatus::EnoughStatistics
        } else {
            EquilibrationStatus::NotEnoughStatistics
        }
    }
}

/// Fails the run if collision-error flags occur in more than half of a
/// sliding window of `window` cycles. Grounded on `ErrorRateProcessor.h`.
#[derive(Debug)]
pub struct ErrorRateProcessor {
    window: usize,
    errors_existed: CircularBuffer<bool>,
    iteration_index: usize,
}

impl ErrorRateProcessor {
    pub fn new(window: usize) -> Self {
        ErrorRateProcessor { window, errors_existed: CircularBuffer::new(window), iteration_index: 0 }
    }
}

impl EquilibrationGatherer for ErrorRateProcessor {
    fn start(&mut self) {
        self.iteration_index = 0;
        self.errors_existed = CircularBuffer::new(self.window);
    }

    fn process_step(&mut self, _particles: &Packing, report: &CycleReport) -> EquilibrationStatus {
        self.errors_existed.replace(self.iteration_index, report.collision_errors_existed);
        self.iteration_index += 1;

        if self.iteration_index < self.window {
            return EquilibrationStatus::NotEnoughStatistics;
        }

        let error_count = (0..self.window).filter(|&i| self.errors_existed[i]).count();
        if error_count * 2 > self.window {
            EquilibrationStatus::ErrorsFound
        } else {
            EquilibrationStatus::EnoughStatistics
        }
    }
}

/// Bookkeeping-only stand-in for `ScatterAndDiffusionProcessor`: tracks
/// mean-squared displacement from the reference packing taken at
/// `start()`, but never declares equilibration on its own — the
/// intermediate-scattering-function decorrelation numerics
/// (`IntermediateScatteringFunctionProcessor.h`) are carried as an open
/// question, not reimplemented here.
#[derive(Debug, Default)]
pub struct ScatterAndDiffusionProcessor {
    reference_packing: Option<Packing>,
    last_mean_squared_displacement: f64,
}

impl ScatterAndDiffusionProcessor {
    pub fn new() -> Self {
        ScatterAndDiffusionProcessor::default()
    }

    pub fn last_mean_squared_displacement(&self) -> f64 {
        self.last_mean_squared_displacement
    }
}

impl EquilibrationGatherer for ScatterAndDiffusionProcessor {
    fn start(&mut self) {
        self.reference_packing = None;
        self.last_mean_squared_displacement = 0.0;
    }

    fn process_step(&mut self, particles: &Packing, _report: &CycleReport) -> EquilibrationStatus {
        let reference = match &self.reference_packing {
            Some(reference) => reference,
            None => {
                self.reference_packing = Some(particles.clone());
                return EquilibrationStatus::NotEnoughStatistics;
            }
        };

        let sum_squared: f64 = particles
            .iter()
            .zip(reference.iter())
            .map(|(p, r)| (p.coordinates - r.coordinates).norm_squared())
            .sum();
        self.last_mean_squared_displacement = sum_squared / particles.len() as f64;

        EquilibrationStatus::NotEnoughStatistics
    }
}

/// Runs every gatherer in the chain and combines their verdicts: any
/// `ErrorsFound` aborts the chain immediately; otherwise "enough
/// statistics" requires every gatherer to agree (§4.8).
pub struct EquilibrationChain {
    gatherers: Vec<Box<dyn EquilibrationGatherer>>,
}

impl EquilibrationChain {
    pub fn new(gatherers: Vec<Box<dyn EquilibrationGatherer>>) -> Self {
        EquilibrationChain { gatherers }
    }

    pub fn start(&mut self) {
        for gatherer in self.gatherers.iter_mut() {
            gatherer.start();
        }
    }

    pub fn process_step(&mut self, particles: &Packing, report: &CycleReport) -> EquilibrationStatus {
        let mut enough_statistics = true;
        for gatherer in self.gatherers.iter_mut() {
            match gatherer.process_step(particles, report) {
                EquilibrationStatus::ErrorsFound => return EquilibrationStatus::ErrorsFound,
                EquilibrationStatus::NotEnoughStatistics => enough_statistics = false,
                EquilibrationStatus::EnoughStatistics => {}
            }
        }
        if enough_statistics {
            EquilibrationStatus::EnoughStatistics
        } else {
            EquilibrationStatus::NotEnoughStatistics
        }
    }
}

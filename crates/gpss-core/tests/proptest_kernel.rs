//! Property-based tests for the simulation kernel.
//!
//! Uses proptest to generate random single-server and storage models, then
//! checks that kernel invariants hold between every clock advance.

use gpss_core::block::BlockKind;
use gpss_core::engine::Simulation;
use gpss_core::sim::{SimConfig, StopReason};
use gpss_core::test_utils::*;
use gpss_core::validation::check_invariants;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

#[derive(Debug, Clone)]
struct ModelParams {
    arrival_mean: i64,
    arrival_spread: i64,
    service_mean: i64,
    service_spread: i64,
    capacity: i64,
    units: i64,
    termination_count: i64,
    seed: u64,
}

fn arb_params() -> impl Strategy<Value = ModelParams> {
    (1..40i64, 0..40i64, 0..60i64, 0..60i64, 1..6i64, 1..6i64, 1..40i64, any::<u64>()).prop_map(
        |(am, asp, sm, ssp, capacity, units, tc, seed)| ModelParams {
            arrival_mean: am,
            // Keep arrivals from landing before the clock.
            arrival_spread: asp.min(am),
            service_mean: sm,
            service_spread: ssp.min(sm),
            capacity,
            units: units.min(capacity),
            termination_count: tc,
            seed,
        },
    )
}

fn storage_model(p: &ModelParams) -> Simulation {
    simulation_with(
        &[
            (Some("SALON"), storage(p.capacity)),
            (None, generate(p.arrival_mean, p.arrival_spread)),
            (None, enter("SALON", p.units)),
            (None, advance(p.service_mean, p.service_spread)),
            (None, leave("SALON", p.units)),
            (None, terminate(1)),
        ],
        SimConfig {
            seed: p.seed,
            termination_count: p.termination_count,
            ..SimConfig::default()
        },
    )
}

fn facility_model(p: &ModelParams) -> Simulation {
    simulation(
        &[
            generate(p.arrival_mean, p.arrival_spread),
            BlockKind::Priority {
                value: gpss_core::operand::Operand::Attribute(gpss_core::operand::Sna::Random(1)),
            },
            queue("COLA"),
            seize("CAJA"),
            depart("COLA"),
            advance(p.service_mean, p.service_spread),
            release("CAJA"),
            terminate(1),
        ],
        SimConfig {
            seed: p.seed,
            termination_count: p.termination_count,
            ..SimConfig::default()
        },
    )
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Chains stay exclusive and storages stay within capacity.
    #[test]
    fn storage_invariants_hold(p in arb_params()) {
        let mut sim = storage_model(&p);
        sim.begin(None);
        let mut last_clock = sim.clock();
        let mut steps = 0u32;
        while sim.step() {
            prop_assert!(check_invariants(&sim).is_ok(), "{:?}", check_invariants(&sim));
            prop_assert!(sim.clock() >= last_clock);
            last_clock = sim.clock();
            let salon = sim.registry().storage(&"SALON".into()).unwrap();
            prop_assert!(salon.free_units() >= 0 && salon.free_units() <= p.capacity);
            steps += 1;
            prop_assert!(steps < 100_000);
        }
        prop_assert_eq!(sim.stop_reason(), Some(StopReason::TerminationCount));
        prop_assert_eq!(sim.termination_count(), 0);
        prop_assert!(!sim.is_degraded());
    }

    /// At most one owner, and the clock never runs backwards.
    #[test]
    fn facility_invariants_hold(p in arb_params()) {
        let mut sim = facility_model(&p);
        sim.begin(None);
        let mut last_clock = sim.clock();
        while sim.step() {
            prop_assert!(check_invariants(&sim).is_ok(), "{:?}", check_invariants(&sim));
            prop_assert!(sim.clock() >= last_clock);
            last_clock = sim.clock();
            let caja = sim.registry().facility(&"CAJA".into());
            if let Some(caja) = caja {
                // The owner is never also waiting.
                if let Some(owner) = caja.owner() {
                    prop_assert!(!caja.delay_chain.contains(owner));
                }
            }
        }
        prop_assert_eq!(sim.termination_count(), 0);
        let terminate = sim.blocks().last().unwrap().id;
        prop_assert_eq!(
            sim.counters(terminate).unwrap().entry_count,
            p.termination_count as u64
        );
    }

    /// The same seed gives the same run.
    #[test]
    fn runs_are_deterministic(p in arb_params()) {
        let a = storage_model(&p).simulate(None);
        let b = storage_model(&p).simulate(None);
        prop_assert_eq!(a, b);
    }
}

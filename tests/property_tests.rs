use fastrand::Rng;
use guildforge::config::GaParams;
use guildforge::optimizer::{Assignment, Cluster, Individual, Objective, Optimizer};
use guildforge::species::Species;
use proptest::prelude::*;

// --- STRATEGIES ---

prop_compose! {
    fn arb_species(n_watersheds: usize)(
        speed in 0.1f64..100.0,
        bits in proptest::collection::vec(0u8..=1, n_watersheds)
    ) -> Species {
        Species::new("sp", speed, bits)
    }
}

prop_compose! {
    fn arb_cluster(n_watersheds: usize)(
        speed in 0.1f64..100.0,
        bits in proptest::collection::vec(0u8..=1, n_watersheds)
    ) -> Cluster {
        Cluster { speed, watersheds: bits }
    }
}

// Species set and cluster list over a shared watershed count.
fn arb_case() -> impl Strategy<Value = (Vec<Species>, Vec<Cluster>)> {
    (1usize..=6, 1usize..=5, 1usize..=4).prop_flat_map(|(n_species, n_ws, n_clusters)| {
        (
            proptest::collection::vec(arb_species(n_ws), n_species),
            proptest::collection::vec(arb_cluster(n_ws), n_clusters),
        )
    })
}

fn objective_for(species: &[Species]) -> Objective {
    let n_ws = species[0].distribution.len();
    Objective {
        weight_speed: 1.0,
        weight_distro: 1.0,
        norm_speed: species.iter().map(|sp| sp.speed * sp.speed).sum(),
        norm_distro: (species.len() * n_ws) as f64,
    }
}

// --- PROPERTIES ---

proptest! {
    #[test]
    fn prop_evaluate_fitness_is_the_sum_of_assignment_values(
        (species, clusters) in arb_case()
    ) {
        let objective = objective_for(&species);
        let mut individual = Individual {
            clusters,
            assignments: Vec::new(),
            fitness: f64::NEG_INFINITY,
        };
        objective.evaluate(&species, &mut individual);

        prop_assert_eq!(individual.assignments.len(), species.len());
        let sum: f64 = individual
            .assignments
            .iter()
            .map(|a| objective.value_of(a))
            .sum();
        prop_assert_eq!(individual.fitness, sum);
    }

    #[test]
    fn prop_assignments_are_argmax_over_clusters(
        (species, clusters) in arb_case()
    ) {
        let objective = objective_for(&species);
        let mut individual = Individual {
            clusters: clusters.clone(),
            assignments: Vec::new(),
            fitness: f64::NEG_INFINITY,
        };
        objective.evaluate(&species, &mut individual);

        for (sp, chosen) in species.iter().zip(&individual.assignments) {
            prop_assert!(chosen.cluster < clusters.len());
            let chosen_value = objective.value_of(chosen);
            for (i, cluster) in clusters.iter().enumerate() {
                let candidate = Assignment {
                    cluster: i,
                    speed_error: objective.speed_error(sp, cluster),
                    distro_fit: objective.distro_fit(sp, cluster),
                };
                prop_assert!(
                    chosen_value >= objective.value_of(&candidate),
                    "Cluster {} beats the chosen {}",
                    i,
                    chosen.cluster
                );
            }
        }
    }

    #[test]
    fn prop_in_range_probability_params_validate(
        crossrate in 0.0f64..=1.0,
        migration in 0.0f64..=1.0,
        elite in 0.0f64..=1.0,
        keepworse in 0.0f64..=1.0,
        mutate_speed in 0.0f64..=1.0,
        mutate_distro in 0.0f64..=1.0,
        popsize in 2usize..=10,
        extra in 0usize..=40,
        n_clusters in 1usize..=10,
    ) {
        let params = GaParams {
            crossrate,
            migration,
            elite,
            keepworse,
            mutate_speed,
            mutate_distro,
            popsize,
            init_size: popsize + extra,
            n_clusters,
            ..GaParams::default()
        };
        prop_assert!(params.validate(10).is_ok());
    }
}

proptest! {
    // Full-run determinism is slow per case; a handful is enough.
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_seeded_runs_repeat_exactly(seed in any::<u64>()) {
        let species = vec![
            Species::new("a", 1.0, vec![1, 0]),
            Species::new("b", 2.0, vec![0, 1]),
        ];
        let optimizer = Optimizer::new(species).unwrap();
        let params = GaParams {
            popsize: 4,
            init_size: 20,
            generations: 5,
            n_clusters: 2,
            ..GaParams::default()
        };

        let mut rng1 = Rng::with_seed(seed);
        let best1 = optimizer.optimize_clusters(&params, &mut rng1).unwrap();
        let mut rng2 = Rng::with_seed(seed);
        let best2 = optimizer.optimize_clusters(&params, &mut rng2).unwrap();
        prop_assert_eq!(best1, best2);
    }
}

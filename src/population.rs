use crate::activation::Activation;
use crate::config::ExperimentConfig;
use crate::error::{NeatError, Result};
use crate::fitness::Evaluation;
use crate::gene::{Genome, InnovationCounter};
use crate::mating::{MatingMethod, MatingMethodWeights};
use crate::network::Network;
use crate::speciation::{is_same_species, SpeciationConfig};
use rand::Rng;

/// A network together with what it achieved in the current generation.
///
/// `selection_score`, `speciation_distance` and `species_member_count` are
/// recomputed every generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Specimen {
    pub network: Network,
    pub score: f64,
    pub bonus: f64,
    pub outcomes: Vec<f64>,
    pub selection_score: f64,
    pub speciation_distance: f64,
    pub species_member_count: usize,
}

impl Specimen {
    /// An offspring that has not been scored yet.

    pub fn new(network: Network) -> Self {
        Specimen::scored(network, Evaluation::default())
    }

    pub fn scored(network: Network, evaluation: Evaluation) -> Self {
        Specimen {
            network: network,
            score: evaluation.score,
            bonus: evaluation.bonus,
            outcomes: evaluation.outcomes,
            selection_score: 0.0,
            speciation_distance: 0.0,
            species_member_count: 0,
        }
    }

    pub fn genome(&self) -> &Genome {
        self.network.genome()
    }
}

#[derive(Debug, Clone)]
pub struct Species {
    representative: Genome,
    members: Vec<Specimen>,
}

impl Species {
    fn founded_by(specimen: Specimen) -> Self {
        Species {
            representative: specimen.genome().clone(),
            members: vec![specimen],
        }
    }

    /// Genome of the founding member. Stays fixed for the species' lifetime.

    pub fn representative(&self) -> &Genome {
        &self.representative
    }

    pub fn members(&self) -> &[Specimen] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// The species of the current generation, in a stable order.
///
/// Reproduction treats all specimens across all species as one contiguous
/// sequence, so bigger species get proportionally more offspring.
#[derive(Debug, Clone)]
pub struct Population {
    species: Vec<Species>,
    speciation: SpeciationConfig,
    mating_method_weights: MatingMethodWeights,
    activation_functions: Vec<Activation>,
    max_add_connection_attempts: usize,
}

impl Population {
    pub fn new(config: &ExperimentConfig) -> Self {
        Population {
            species: Vec::new(),
            speciation: config.speciation,
            mating_method_weights: config.mating_method_weights,
            activation_functions: config.activation_functions.clone(),
            max_add_connection_attempts: config.max_add_connection_attempts,
        }
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    /// Number of specimens over all species.

    pub fn len(&self) -> usize {
        self.species.iter().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Puts `specimen` into the first species whose representative is close
    /// enough, or founds a new species at the end.

    pub fn add_specimen(&mut self, mut specimen: Specimen) {
        for species in self.species.iter_mut() {
            let (same, distance) = is_same_species(&species.representative, specimen.genome(), &self.speciation);
            if same {
                specimen.speciation_distance = distance;
                species.members.push(specimen);
                return;
            }
        }

        debug!("founding species #{}", self.species.len());
        specimen.speciation_distance = 0.0;
        self.species.push(Species::founded_by(specimen));
    }

    /// Maps a global index over all specimens to (species, member).

    fn locate(&self, mut index: usize) -> Option<(usize, usize)> {
        for (s, species) in self.species.iter().enumerate() {
            if index < species.len() {
                return Some((s, index));
            }
            index -= species.len();
        }
        None
    }

    /// Breeds offspring until the population holds `target_size` specimens.
    ///
    /// Parents are drawn uniformly over all current specimens. The offspring
    /// are speciated only after breeding, so every parent is drawn from the
    /// same generation. Returns the number of offspring added.
    ///
    /// # Errors
    ///
    /// If the population is empty, or if a genome turns out to be inconsistent.

    pub fn fill_out<R>(&mut self,
                       target_size: usize,
                       innovations: &mut InnovationCounter,
                       rng: &mut R)
                       -> Result<usize>
        where R: Rng
    {
        let current = self.len();
        if current >= target_size {
            return Ok(0);
        }
        if current == 0 {
            return Err(NeatError::EmptyPopulation);
        }

        let mut offspring = Vec::with_capacity(target_size - current);
        while current + offspring.len() < target_size {
            let (s, m) = match self.locate(rng.gen_range(0..current)) {
                Some(found) => found,
                None => return Err(NeatError::EmptyPopulation),
            };
            let child = self.breed(s, m, innovations, rng)?;
            offspring.push(Specimen::new(child));
        }

        let added = offspring.len();
        for specimen in offspring {
            self.add_specimen(specimen);
        }
        debug!("bred {} offspring, {} species", added, self.species.len());
        Ok(added)
    }

    fn breed<R>(&self,
                s: usize,
                m: usize,
                innovations: &mut InnovationCounter,
                rng: &mut R)
                -> Result<Network>
        where R: Rng
    {
        let members = &self.species[s].members;
        let parent = &members[m];
        let can_mate = members.len() >= 2;

        match MatingMethod::random_with(&self.mating_method_weights, can_mate, rng) {
            MatingMethod::Mate => {
                // any other member of the same species
                let mut p = rng.gen_range(0..members.len() - 1);
                if p >= m {
                    p += 1;
                }
                let partner = &members[p];
                if partner.score > parent.score {
                    Network::crossover(&partner.network, &parent.network, rng)
                } else {
                    Network::crossover(&parent.network, &partner.network, rng)
                }
            }
            MatingMethod::MutateAddNode => {
                let mut child = parent.network.clone();
                if !child.mutate_add_node(innovations, &self.activation_functions, rng)? {
                    child.mutate_change_weight(rng);
                }
                Ok(child)
            }
            MatingMethod::MutateAddConnection => {
                let mut child = parent.network.clone();
                child.mutate_add_connection(innovations, self.max_add_connection_attempts, rng)?;
                Ok(child)
            }
            MatingMethod::MutateChangeWeight => {
                let mut child = parent.network.clone();
                child.mutate_change_weight(rng);
                Ok(child)
            }
        }
    }

    /// Removes every specimen, in population order. Species (and their
    /// representatives) are kept until `prune_empty_species`.

    pub fn dump_specimens(&mut self) -> Vec<Specimen> {
        let mut all = Vec::with_capacity(self.len());
        for species in self.species.iter_mut() {
            all.append(&mut species.members);
        }
        all
    }

    /// Copies of all networks, in population order.

    pub fn dump_networks(&self) -> Vec<Network> {
        self.species
            .iter()
            .flat_map(|s| s.members.iter().map(|m| m.network.clone()))
            .collect()
    }

    /// Stamps each specimen with the size of its species (fitness sharing).

    pub fn weight_species(&mut self) {
        for species in self.species.iter_mut() {
            let count = species.members.len();
            for member in species.members.iter_mut() {
                member.species_member_count = count;
            }
        }
    }

    /// Drops species without members. Survivors keep their relative order.

    pub fn prune_empty_species(&mut self) {
        let before = self.species.len();
        self.species.retain(|s| !s.is_empty());
        if self.species.len() < before {
            debug!("pruned {} empty species", before - self.species.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::Gene;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config(threshold: f64) -> ExperimentConfig {
        ExperimentConfig {
            speciation: SpeciationConfig {
                c1: 1.0,
                c2: 1.0,
                c3: 0.0,
                threshold: threshold,
            },
            ..ExperimentConfig::default()
        }
    }

    /// A network whose genome consists of connection genes with the given ids.
    fn with_ids(ids: &[u64]) -> Specimen {
        let genes = ids
            .iter()
            .enumerate()
            .map(|(i, &id)| Gene::connection(id, if i == 0 { "x" } else { "b" }, "y", 0.5))
            .collect();
        Specimen::new(Network::new(&["x"], &["y"], Genome::from_genes(genes)).unwrap())
    }

    fn sizes(p: &Population) -> Vec<usize> {
        p.species().iter().map(|s| s.len()).collect()
    }

    #[test]
    fn test_first_fit_speciation() {
        let mut p = Population::new(&config(0.5));
        p.add_specimen(with_ids(&[0, 1]));
        p.add_specimen(with_ids(&[5, 6]));
        p.add_specimen(with_ids(&[0, 1]));
        p.add_specimen(with_ids(&[5, 6]));
        assert_eq!(vec![2, 2], sizes(&p));
        assert_eq!(Some(1), p.species()[0].representative().max_innovation());
        assert_eq!(Some(6), p.species()[1].representative().max_innovation());
    }

    #[test]
    fn test_first_fit_not_best_fit() {
        // [0, 1, 2, 3] is closer to the second representative, but it is
        // compatible with the first one and joins that
        let mut p = Population::new(&config(0.5));
        p.add_specimen(with_ids(&[0, 1]));
        p.add_specimen(with_ids(&[0, 1, 2, 3, 4, 5]));
        assert_eq!(vec![1, 1], sizes(&p));
        let mut probe = with_ids(&[0, 1, 2, 3]);
        probe.score = 7.0;
        p.add_specimen(probe);
        assert_eq!(vec![2, 1], sizes(&p));
        assert_eq!(7.0, p.species()[0].members()[1].score);
        assert_eq!(0.5, p.species()[0].members()[1].speciation_distance);
    }

    #[test]
    fn test_threshold_zero_single_species() {
        let mut p = Population::new(&config(0.0));
        p.add_specimen(with_ids(&[0, 1]));
        p.add_specimen(with_ids(&[5, 6]));
        p.add_specimen(with_ids(&[9]));
        assert_eq!(vec![3], sizes(&p));
    }

    #[test]
    fn test_weight_prune_and_dump() {
        let mut p = Population::new(&config(0.5));
        p.add_specimen(with_ids(&[0, 1]));
        p.add_specimen(with_ids(&[5, 6]));
        p.add_specimen(with_ids(&[0, 1]));
        p.add_specimen(with_ids(&[9, 10]));
        p.weight_species();
        let counts: Vec<usize> = p
            .species()
            .iter()
            .flat_map(|s| s.members().iter().map(|m| m.species_member_count))
            .collect();
        assert_eq!(vec![2, 2, 1, 1], counts);
        assert_eq!(4, p.dump_networks().len());
        assert_eq!(4, p.len());

        let all = p.dump_specimens();
        assert_eq!(4, all.len());
        assert_eq!(Some(1), all[1].genome().max_innovation());
        assert_eq!(0, p.len());
        assert_eq!(3, p.species().len());

        // survivors only re-populate the last species; the other two go away
        p.add_specimen(all[3].clone());
        p.prune_empty_species();
        assert_eq!(vec![1], sizes(&p));
        assert_eq!(Some(10), p.species()[0].representative().max_innovation());
    }

    #[test]
    fn test_prune_preserves_order() {
        let mut p = Population::new(&config(0.5));
        for ids in [[0u64, 1], [5, 6], [9, 10], [20, 21]].iter() {
            p.add_specimen(with_ids(ids));
        }
        let mut all = p.dump_specimens();
        p.add_specimen(all.remove(3));
        p.add_specimen(all.remove(1));
        p.prune_empty_species();
        let reps: Vec<_> = p.species().iter().map(|s| s.representative().max_innovation()).collect();
        assert_eq!(vec![Some(6), Some(21)], reps);
    }

    /// Species of sizes [2, 1, 3].
    fn uneven() -> Population {
        let mut p = Population::new(&config(0.5));
        for ids in [[0u64, 1], [0, 1], [5, 6], [9, 10], [9, 10], [9, 10]].iter() {
            p.add_specimen(with_ids(ids));
        }
        assert_eq!(vec![2, 1, 3], sizes(&p));
        p
    }

    #[test]
    fn test_locate_global_index() {
        let p = uneven();
        let located: Vec<_> = (0..6).map(|i| p.locate(i)).collect();
        assert_eq!(vec![Some((0, 0)), Some((0, 1)), Some((1, 0)), Some((2, 0)), Some((2, 1)), Some((2, 2))],
                   located);
        assert_eq!(None, p.locate(6));
    }

    #[test]
    fn test_parents_drawn_in_proportion_to_species_size() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut innovations = InnovationCounter::starting_after(10);
        let mut p = uneven();
        // weight changes keep the gene ids, so every child joins its parent's species
        p.mating_method_weights = MatingMethodWeights {
            mate: 0,
            mutate_add_node: 0,
            mutate_add_connection: 0,
            mutate_change_weight: 1,
        };

        assert_eq!(3000, p.fill_out(3006, &mut innovations, &mut rng).unwrap());
        let children: Vec<f64> = sizes(&p)
            .iter()
            .zip([2, 1, 3].iter())
            .map(|(&now, &before)| (now - before) as f64)
            .collect();
        for (&got, &expected) in children.iter().zip([1000.0, 500.0, 1500.0].iter()) {
            assert!((got - expected).abs() < 0.2 * expected, "{:?}", children);
        }
    }

    #[test]
    fn test_fill_out() {
        let mut rng = StdRng::seed_from_u64(1234);
        let mut innovations = InnovationCounter::new();
        let cfg = config(2.0);
        let mut p = Population::new(&cfg);
        let template = Network::fully_connected(&["x1", "x2"], &["y"], &mut innovations, &mut rng).unwrap();
        p.add_specimen(Specimen::new(template.randomized_clone(&mut rng)));

        assert_eq!(29, p.fill_out(30, &mut innovations, &mut rng).unwrap());
        assert_eq!(30, p.len());
        assert_eq!(0, p.fill_out(30, &mut innovations, &mut rng).unwrap());
        assert_eq!(0, p.fill_out(10, &mut innovations, &mut rng).unwrap());

        for net in p.dump_networks() {
            assert!(net.genome().is_sorted());
            assert!(net.topology().unwrap().is_acyclic());
        }
    }

    #[test]
    fn test_fill_out_multiple_generations() {
        let mut rng = StdRng::seed_from_u64(77);
        let mut innovations = InnovationCounter::new();
        let mut cfg = config(0.3);
        cfg.mating_method_weights = MatingMethodWeights {
            mate: 1,
            mutate_add_node: 1,
            mutate_add_connection: 1,
            mutate_change_weight: 1,
        };
        let mut p = Population::new(&cfg);
        let template = Network::fully_connected(&["x"], &["y", "z"], &mut innovations, &mut rng).unwrap();
        p.add_specimen(Specimen::new(template));

        let mut most_species = 0;
        for _ in 0..10 {
            p.fill_out(20, &mut innovations, &mut rng).unwrap();
            assert_eq!(20, p.len());
            most_species = most_species.max(p.species().len());
            let mut all = p.dump_specimens();
            for (i, s) in all.iter_mut().enumerate() {
                s.score = i as f64;
            }
            // keep the better half
            for s in all.into_iter().skip(10) {
                p.add_specimen(s);
            }
            p.prune_empty_species();
            assert!(p.species().iter().all(|s| !s.is_empty()));
        }
        assert!(most_species > 1);
        assert!(p.dump_networks().iter().all(|n| n.topology().unwrap().is_acyclic()));
    }

    #[test]
    fn test_fill_out_empty_population() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut innovations = InnovationCounter::new();
        let mut p = Population::new(&config(1.0));
        assert_eq!(Err(NeatError::EmptyPopulation), p.fill_out(5, &mut innovations, &mut rng));
    }
}

//! Target genomes: chromosomes of decoded nucleotide bytes (spec §3,
//! "Target sequence").
//!
//! FASTA parsing is out of scope (spec §1); a [`Genome`] is built directly
//! from already-decoded byte sequences supplied by the caller, the same
//! way the teacher's genome module was built from an already-opened
//! `.genome` file — only here the "external collaborator" hands over
//! sequence bytes instead of chromosome sizes.

use crate::probe::reverse_complement_bytes;

/// One chromosome's sequence within a [`Genome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chromosome {
    pub name: String,
    pub sequence: Vec<u8>,
}

impl Chromosome {
    pub fn new(name: impl Into<String>, sequence: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            sequence: sequence.into(),
        }
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.sequence.len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// A genome: an ordered collection of chromosomes (spec §3). Positions in
/// the genome are addressed by a single integer offset across the
/// concatenation of chromosomes in declared order; [`Genome`] itself never
/// concatenates the sequences (the scanner offsets per-chromosome
/// coordinates instead, so a single match never silently crosses a
/// chromosome boundary).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Genome {
    pub chromosomes: Vec<Chromosome>,
}

impl Genome {
    pub fn new(chromosomes: Vec<Chromosome>) -> Self {
        Self { chromosomes }
    }

    /// Total length: the sum of chromosome lengths (spec §3).
    pub fn len(&self) -> u64 {
        self.chromosomes.iter().map(Chromosome::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    /// The offset, in the genome's single running coordinate, of the start
    /// of chromosome `index` — i.e. the sum of the lengths of all
    /// preceding chromosomes (spec §3, §4.6).
    pub fn chromosome_offset(&self, index: usize) -> u64 {
        self.chromosomes[..index].iter().map(Chromosome::len).sum()
    }

    /// The reverse complement of this genome: each chromosome is
    /// complemented independently, in the same declared order (spec §4.6:
    /// "complements each chromosome independently ... not the
    /// concatenation"). Chromosome names are preserved.
    pub fn reverse_complement(&self) -> Genome {
        Genome::new(
            self.chromosomes
                .iter()
                .map(|c| Chromosome::new(c.name.clone(), reverse_complement_bytes(&c.sequence)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_genome() -> Genome {
        Genome::new(vec![
            Chromosome::new("chr1", b"ACGTACGT".to_vec()),
            Chromosome::new("chr2", b"TTTT".to_vec()),
        ])
    }

    #[test]
    fn test_genome_length_sums_chromosomes() {
        assert_eq!(sample_genome().len(), 12);
    }

    #[test]
    fn test_chromosome_offset() {
        let g = sample_genome();
        assert_eq!(g.chromosome_offset(0), 0);
        assert_eq!(g.chromosome_offset(1), 8);
    }

    #[test]
    fn test_reverse_complement_per_chromosome() {
        let g = sample_genome();
        let rc = g.reverse_complement();
        assert_eq!(rc.chromosomes[0].sequence, b"ACGTACGT".to_vec()); // palindromic
        assert_eq!(rc.chromosomes[1].sequence, b"AAAA".to_vec());
        assert_eq!(rc.len(), g.len());
    }

    #[test]
    fn test_reverse_complement_involutive() {
        let g = sample_genome();
        assert_eq!(g.reverse_complement().reverse_complement(), g);
    }
}

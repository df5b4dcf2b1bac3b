//! Variant-level quality decisions and pathogenicity categories.

use crate::{
    conf::Conf,
    ingest::normalize::undo_date_artifact,
    schema::{Category, VariantRecord},
};

/// Quality filter settings for variant calls.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityFilter {
    /// Minimal allele balance of a call.
    pub min_allele_balance: f64,
    /// Known false positive `(gene, exon)` pairs, exons in `<exon>/<total>`
    /// notation.
    pub false_positives: Vec<(String, String)>,
    /// Genes whose calls are ignored.
    pub excluded_genes: Vec<String>,
}

impl QualityFilter {
    /// Construct from the configuration.
    pub fn from_conf(conf: &Conf) -> Self {
        Self {
            min_allele_balance: conf.thresholds.min_allele_balance,
            false_positives: conf
                .false_positives
                .iter()
                .flat_map(|locus| {
                    locus
                        .exons
                        .iter()
                        .map(|exon| (locus.gene.clone(), undo_date_artifact(exon)))
                })
                .collect(),
            excluded_genes: conf.excluded_genes.clone(),
        }
    }

    /// Whether the call lies on a known false positive gene/exon.
    ///
    /// Date-mangled exon labels ("01-Jul") are equivalent to "1/7".
    pub fn is_false_positive(&self, variant: &VariantRecord) -> bool {
        match (variant.symbol.as_deref(), variant.exon.as_deref()) {
            (Some(symbol), Some(exon)) => {
                let exon = undo_date_artifact(exon);
                self.false_positives
                    .iter()
                    .any(|(fp_gene, fp_exon)| fp_gene == symbol && *fp_exon == exon)
            }
            _ => false,
        }
    }

    /// Whether the allele balance is below the threshold, missing balance
    /// never fails.
    pub fn is_low_allele_balance(&self, variant: &VariantRecord) -> bool {
        variant
            .ab
            .map(|ab| ab < self.min_allele_balance)
            .unwrap_or(false)
    }

    /// Whether the call is a known false positive or has low allele balance.
    pub fn is_disqualified(&self, variant: &VariantRecord) -> bool {
        let result = self.is_false_positive(variant) || self.is_low_allele_balance(variant);
        if result {
            tracing::trace!(
                "call {:?}/{:?} of sample {} is disqualified (AB={:?})",
                &variant.symbol,
                &variant.exon,
                &variant.sample,
                &variant.ab
            );
        }
        result
    }

    /// Whether the call is on an excluded gene.
    pub fn is_excluded_gene(&self, variant: &VariantRecord) -> bool {
        variant
            .symbol
            .as_deref()
            .map(|symbol| self.excluded_genes.iter().any(|gene| gene == symbol))
            .unwrap_or(false)
    }

    /// The three-tier category of the (optional) variant.
    ///
    /// False positive calls are always "Likely Benign / No Variant".
    pub fn category(&self, variant: Option<&VariantRecord>) -> Category {
        match variant {
            Some(variant) if self.is_false_positive(variant) => Category::LikelyBenignNoVariant,
            Some(variant) => Category::from(variant.classification),
            None => Category::LikelyBenignNoVariant,
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::schema::Classification;

    fn variant(symbol: &str, exon: &str, ab: Option<f64>) -> VariantRecord {
        VariantRecord {
            sample: "S1".into(),
            symbol: Some(symbol.into()),
            exon: Some(exon.into()),
            ab,
            classification: Some(Classification::Pathogenic),
            ..Default::default()
        }
    }

    #[rstest::rstest]
    #[case("SKI", "1/7", true)]
    #[case("SKI", "01-Jul", true)]
    #[case("SKI", "2/7", false)]
    #[case("TGFBR2", "1/7", false)]
    fn false_positive_equivalence(
        #[case] symbol: &str,
        #[case] exon: &str,
        #[case] expected: bool,
    ) {
        let filter = QualityFilter::from_conf(&Conf::default());
        let variant = variant(symbol, exon, Some(0.5));

        assert_eq!(expected, filter.is_false_positive(&variant));
        assert_eq!(expected, filter.is_disqualified(&variant));
        let expected_category = if expected {
            Category::LikelyBenignNoVariant
        } else {
            Category::PathogenicLikelyPathogenic
        };
        assert_eq!(expected_category, filter.category(Some(&variant)));
    }

    #[rstest::rstest]
    #[case(Some(0.29), true)]
    #[case(Some(0.3), false)]
    #[case(Some(0.5), false)]
    #[case(None, false)]
    fn allele_balance(#[case] ab: Option<f64>, #[case] expected: bool) {
        let filter = QualityFilter::from_conf(&Conf::default());

        assert_eq!(expected, filter.is_low_allele_balance(&variant("FBN1", "3/65", ab)));
    }

    #[test]
    fn excluded_gene_and_missing_variant() {
        let filter = QualityFilter::from_conf(&Conf::default());

        assert!(filter.is_excluded_gene(&variant("SMAD4", "5/11", None)));
        assert!(!filter.is_excluded_gene(&variant("SMAD3", "5/9", None)));
        assert_eq!(Category::LikelyBenignNoVariant, filter.category(None));
    }
}

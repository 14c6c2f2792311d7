use crate::normals::error::NormalsError;
use crate::normals::extract::extract_normals;
use crate::normals::source::NormalsSource;
use crate::types::normals::MonthlyNormals;
use crate::LatLon;

/// Fetches converted monthly normals for a point from a [`NormalsSource`].
pub struct ClimateFetcher<'a, S: NormalsSource> {
    source: &'a S,
}

impl<'a, S: NormalsSource> ClimateFetcher<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// `Ok(None)` means the point has no usable normals (no data, or fewer than
    /// twelve months); the caller skips it.
    pub async fn fetch(&self, location: LatLon) -> Result<Option<MonthlyNormals>, NormalsError> {
        match self.source.normals_frame(location).await? {
            Some(frame) => extract_normals(&frame),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::normals::extract::tests::normals_frame;
    use crate::types::month::CalendarMonth;
    use polars::prelude::DataFrame;
    use std::collections::HashMap;

    /// What a fake source answers for one coordinate.
    #[derive(Clone)]
    pub(crate) enum FakeAnswer {
        Frame(DataFrame),
        NoData,
        Fail,
    }

    /// Answers by exact coordinate; unknown coordinates have no data.
    pub(crate) struct FakeNormalsSource {
        answers: HashMap<(u64, u64), FakeAnswer>,
    }

    impl FakeNormalsSource {
        pub(crate) fn new(answers: Vec<(LatLon, FakeAnswer)>) -> Self {
            Self {
                answers: answers
                    .into_iter()
                    .map(|(l, a)| ((l.0.to_bits(), l.1.to_bits()), a))
                    .collect(),
            }
        }
    }

    impl NormalsSource for FakeNormalsSource {
        async fn normals_frame(
            &self,
            location: LatLon,
        ) -> Result<Option<DataFrame>, NormalsError> {
            match self
                .answers
                .get(&(location.0.to_bits(), location.1.to_bits()))
            {
                Some(FakeAnswer::Frame(frame)) => Ok(Some(frame.clone())),
                Some(FakeAnswer::Fail) => Err(NormalsError::MissingColumn("month".to_string())),
                Some(FakeAnswer::NoData) | None => Ok(None),
            }
        }
    }

    #[tokio::test]
    async fn test_fetch_full_year() -> Result<(), NormalsError> {
        let here = LatLon(38.72, -9.14);
        let source = FakeNormalsSource::new(vec![(here, FakeAnswer::Frame(normals_frame(12)))]);
        let normals = ClimateFetcher::new(&source).fetch(here).await?;
        assert_eq!(
            normals.map(|n| n.tavg_f.get(CalendarMonth::Jan)),
            Some(Some(51.8))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_partial_year_is_empty() -> Result<(), NormalsError> {
        let here = LatLon(1.0, 2.0);
        let source = FakeNormalsSource::new(vec![(here, FakeAnswer::Frame(normals_frame(11)))]);
        assert_eq!(ClimateFetcher::new(&source).fetch(here).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_propagates_source_errors() {
        let here = LatLon(1.0, 2.0);
        let source = FakeNormalsSource::new(vec![(here, FakeAnswer::Fail)]);
        assert!(ClimateFetcher::new(&source).fetch(here).await.is_err());
    }
}

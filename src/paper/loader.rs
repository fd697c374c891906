use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::paper::{Corpus, CorpusError, PaperRecord};
use crate::utils::normalizer::{clean, normalize_list_like, Coerced};

/// Columns that must be present, checked in this order.
const REQUIRED_COLUMNS: [&str; 3] = ["paper_id", "title", "abstract"];

/// Reads the raw paper table into a [`Corpus`].
///
/// Header handling: `id` stands in for `paper_id` when the latter is absent.
/// Cell handling: empty cells count as missing, short rows are padded with
/// missing cells, malformed numbers and lists fall back to their defaults.
pub struct CorpusLoader;

/// Column positions resolved once from the header row.
struct Columns {
    paper_id: usize,
    title: usize,
    abstract_text: usize,
    authors: Option<usize>,
    references: Option<usize>,
    venue: Option<usize>,
    year: Option<usize>,
    n_citation: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, CorpusError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str, idx: Option<usize>| {
            idx.ok_or_else(|| CorpusError::MissingColumn(name.to_string()))
        };
        let [paper_id_col, title_col, abstract_col] = REQUIRED_COLUMNS;

        let paper_id = require(paper_id_col, find(paper_id_col).or_else(|| find("id")))?;
        let title = require(title_col, find(title_col))?;
        let abstract_text = require(abstract_col, find(abstract_col))?;

        Ok(Self {
            paper_id,
            title,
            abstract_text,
            authors: find("authors"),
            references: find("references"),
            venue: find("venue"),
            year: find("year"),
            n_citation: find("n_citation"),
        })
    }
}

/// Per-field fallback counters, logged once after a load.
#[derive(Debug, Default)]
struct FallbackStats {
    authors: usize,
    references: usize,
    year: usize,
    n_citation: usize,
}

impl CorpusLoader {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Corpus, CorpusError> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "loading paper table");
        let file = File::open(path).map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_from_reader(file)
    }

    pub fn load_from_reader<R: Read>(reader: R) -> Result<Corpus, CorpusError> {
        let mut csv_reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let columns = Columns::resolve(&headers)?;

        let mut stats = FallbackStats::default();
        let mut records = Vec::new();
        for row in csv_reader.records() {
            let row = row?;
            records.push(Self::parse_row(&row, &columns, &mut stats));
        }

        tracing::info!(
            papers = records.len(),
            authors_fallback = stats.authors,
            references_fallback = stats.references,
            year_fallback = stats.year,
            n_citation_fallback = stats.n_citation,
            "paper table loaded"
        );
        Ok(Corpus::new(records))
    }

    fn parse_row(row: &StringRecord, columns: &Columns, stats: &mut FallbackStats) -> PaperRecord {
        let title = cell(row, Some(columns.title)).unwrap_or_default().to_string();
        let abstract_text = cell(row, Some(columns.abstract_text)).unwrap_or_default().to_string();

        let authors_str = list_field(row, columns.authors, &mut stats.authors);
        let references_str = list_field(row, columns.references, &mut stats.references);

        let year = match columns.year {
            Some(idx) => tally(coerce_year(cell(row, Some(idx))), &mut stats.year),
            None => None,
        };
        let n_citation = match columns.n_citation {
            Some(idx) => tally(coerce_citations(cell(row, Some(idx))), &mut stats.n_citation),
            None => 0,
        };

        let text_clean = clean(Some(&format!("{} {}", title, abstract_text)));

        PaperRecord {
            paper_id: cell(row, Some(columns.paper_id)).unwrap_or_default().to_string(),
            title,
            abstract_text,
            authors_str,
            references_str,
            venue: cell(row, columns.venue).unwrap_or_default().to_string(),
            year,
            n_citation,
            text_clean,
        }
    }
}

/// Cell at `idx`, `None` when the column is absent, the row is short or the cell is empty.
#[inline]
fn cell(row: &StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| row.get(i)).filter(|s| !s.is_empty())
}

#[inline]
fn tally<T>(value: Coerced<T>, counter: &mut usize) -> T {
    if value.is_fallback() {
        *counter += 1;
    }
    value.into_inner()
}

fn list_field(row: &StringRecord, idx: Option<usize>, counter: &mut usize) -> String {
    match idx {
        Some(_) => match cell(row, idx) {
            // an empty cell is a legitimately empty list, not a parse failure
            None => String::new(),
            raw => tally(normalize_list_like(raw), counter),
        },
        None => String::new(),
    }
}

/// Integer years, or floats with no fractional part (`"2019.0"`).
pub(crate) fn coerce_year(raw: Option<&str>) -> Coerced<Option<i32>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Coerced::Fallback(None);
    };
    if let Ok(year) = raw.parse::<i32>() {
        return Coerced::Parsed(Some(year));
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 => {
            Coerced::Parsed(Some(f as i32))
        }
        _ => Coerced::Fallback(None),
    }
}

/// Citation counts; floats are truncated, anything negative or non-numeric is 0.
pub(crate) fn coerce_citations(raw: Option<&str>) -> Coerced<u64> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Coerced::Fallback(0);
    };
    if let Ok(n) = raw.parse::<i64>() {
        return match u64::try_from(n) {
            Ok(n) => Coerced::Parsed(n),
            Err(_) => Coerced::Fallback(0),
        };
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f < i64::MAX as f64 => Coerced::Parsed(f.trunc() as u64),
        _ => Coerced::Fallback(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_str(csv: &str) -> Result<Corpus, CorpusError> {
        CorpusLoader::load_from_reader(csv.as_bytes())
    }

    #[test]
    fn loads_and_derives_clean_text() {
        let corpus = load_str(
            "paper_id,title,abstract,authors,references,venue,year,n_citation\n\
             p1,Deep Nets!,Conv. layers,\"['A. Smith', 'B. Jones']\",\"['r1','r2']\",NeurIPS,2019,12\n\
             p2,Graphs,,A. Smith,,,2001.0,3.9\n",
        )
        .unwrap();
        assert_eq!(corpus.len(), 2);

        let first = &corpus.records()[0];
        assert_eq!(first.text_clean, "deep nets conv layers");
        assert_eq!(first.authors_str, "A. Smith, B. Jones");
        assert_eq!(first.references_str, "r1, r2");
        assert_eq!(first.venue, "NeurIPS");
        assert_eq!(first.year, Some(2019));
        assert_eq!(first.n_citation, 12);

        let second = &corpus.records()[1];
        assert_eq!(second.abstract_text, "");
        assert_eq!(second.text_clean, "graphs");
        assert_eq!(second.authors_str, "A. Smith");
        assert_eq!(second.year, Some(2001));
        assert_eq!(second.n_citation, 3);
    }

    #[test]
    fn id_column_is_aliased() {
        let corpus = load_str("id,title,abstract\n7,T,A\n").unwrap();
        assert_eq!(corpus.records()[0].paper_id, "7");
    }

    #[test]
    fn missing_required_column_is_named() {
        let err = load_str("paper_id,title\np1,T\n").unwrap_err();
        assert!(matches!(err, CorpusError::MissingColumn(ref c) if c == "abstract"));

        let err = load_str("title,abstract\nT,A\n").unwrap_err();
        assert!(matches!(err, CorpusError::MissingColumn(ref c) if c == "paper_id"));
    }

    #[test]
    fn optional_columns_default() {
        let corpus = load_str("paper_id,title,abstract\np1,T,A\n").unwrap();
        let record = &corpus.records()[0];
        assert_eq!(record.authors_str, "");
        assert_eq!(record.references_str, "");
        assert_eq!(record.venue, "");
        assert_eq!(record.year, None);
        assert_eq!(record.n_citation, 0);
    }

    #[test]
    fn short_rows_and_bad_numbers_fall_back() {
        let corpus = load_str(
            "paper_id,title,abstract,year,n_citation\n\
             p1,T,A,unknown,-4\n\
             p2,T2,A2\n\
             p3,T3,A3,1999.5,lots\n",
        )
        .unwrap();
        let years: Vec<_> = corpus.iter().map(|r| r.year).collect();
        let cites: Vec<_> = corpus.iter().map(|r| r.n_citation).collect();
        assert_eq!(years, vec![None, None, None]);
        assert_eq!(cites, vec![0, 0, 0]);
    }

    #[test]
    fn numeric_coercion_rules() {
        assert_eq!(coerce_year(Some(" 2020 ")), Coerced::Parsed(Some(2020)));
        assert_eq!(coerce_year(Some("2020.0")), Coerced::Parsed(Some(2020)));
        assert_eq!(coerce_year(Some("20x0")), Coerced::Fallback(None));
        assert_eq!(coerce_citations(Some("17.8")), Coerced::Parsed(17));
        assert_eq!(coerce_citations(None), Coerced::Fallback(0));
        assert_eq!(coerce_citations(Some("NaN")), Coerced::Fallback(0));
        // beyond the integer range
        assert_eq!(coerce_citations(Some("1e30")), Coerced::Fallback(0));
        assert_eq!(coerce_citations(Some("9.2e18")), Coerced::Parsed(9_200_000_000_000_000_000));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = CorpusLoader::load("/no/such/papers.csv").unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));
    }
}

use num::Num;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ZeroSpVec;

impl<N> Serialize for ZeroSpVec<N>
where
    N: Num + Serialize + Copy,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer {
        // fields: len, nnz, entries
        let mut state = serializer.serialize_struct("ZeroSpVec", 3)?;
        state.serialize_field("len", &(self.len() as u64))?;
        state.serialize_field("nnz", &(self.nnz() as u64))?;

        // entries: ordered Vec of (index, value)
        let entries: Vec<(u64, N)> = self.raw_iter()
            .map(|(idx, val)| (idx as u64, *val))
            .collect();
        state.serialize_field("entries", &entries)?;
        state.end()
    }
}

impl<'de, N> Deserialize<'de> for ZeroSpVec<N>
where
    N: Num + Deserialize<'de> + Copy,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        #[derive(Deserialize)]
        struct ZeroSpVecData<N> {
            len: usize,
            nnz: usize,
            entries: Vec<(u64, N)>,
        }

        let data = ZeroSpVecData::deserialize(deserializer)?;
        if data.entries.len() != data.nnz {
            return Err(serde::de::Error::custom(format!(
                "ZeroSpVec nnz mismatch: header says {}, found {} entries",
                data.nnz,
                data.entries.len()
            )));
        }
        if let Some((idx, _)) = data.entries.iter().find(|(idx, _)| *idx as usize >= data.len) {
            return Err(serde::de::Error::custom(format!(
                "ZeroSpVec index {} out of bounds for len {}",
                idx, data.len
            )));
        }

        let entries = data.entries
            .into_iter()
            .map(|(idx, val)| (idx as usize, val))
            .collect();
        Ok(ZeroSpVec::from_entries(data.len, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbor_keeps_sparse_layout() {
        let v = ZeroSpVec::from_entries(10, vec![(7, 0.25f32), (2, 0.5)]);
        let bytes = serde_cbor::to_vec(&v).unwrap();
        let back: ZeroSpVec<f32> = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(back.len(), 10);
        assert_eq!(back.nnz(), 2);
        assert_eq!(back, v);
    }

    #[test]
    fn rejects_out_of_bounds_index() {
        let json = r#"{"len":2,"nnz":1,"entries":[[5,1.0]]}"#;
        let err = serde_json::from_str::<ZeroSpVec<f32>>(json).unwrap_err();
        assert!(err.to_string().contains("out of bounds"));
    }
}

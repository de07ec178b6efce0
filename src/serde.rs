//! Serialization and Deserialization implementation

use ::serde::de::Error;
use ::serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{NetTrie, NetTrieSet, Network};

impl Serialize for Network {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

impl<T: Serialize> Serialize for NetTrie<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut pairs: Vec<(Network, &T)> = Vec::with_capacity(self.len());
        self.visit_values(|net, value| pairs.push((*net, value)));
        pairs.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for NetTrie<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let pairs: Vec<(Network, T)> = Vec::deserialize(deserializer)?;
        Ok(Self::from_iter(pairs))
    }
}

impl Serialize for NetTrieSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut networks: Vec<Network> = Vec::with_capacity(self.len());
        self.inner().visit_values(|net, _| networks.push(*net));
        networks.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NetTrieSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let networks: Vec<Network> = Vec::deserialize(deserializer)?;
        Ok(Self::from_iter(networks))
    }
}

//! Decoder configuration files
//!
//! A [`DecoderConfig`] describes a BCJR decoder, an LDPC decoder, a PAM modem, or any combination of
//! them, in JSON. Every section is optional.
//!
//! # Examples
//!
//! ```
//! use softdec::config::DecoderConfig;
//!
//! let json = r#"{
//!     "bcjr": {
//!         "polynomials": [11, 13],
//!         "block_len": 40,
//!         "buffered_encoding": true,
//!         "max_star": "LinearLogMAP"
//!     },
//!     "ldpc": {
//!         "graph": { "num_vars": 7, "checks": [[0, 2, 4, 6], [1, 2, 5, 6], [3, 4, 5, 6]] },
//!         "n_ite": 20,
//!         "enable_syndrome": true,
//!         "syndrome_depth": 2,
//!         "update_rule": { "NormalizedMinSum": { "factor": 0.75 } },
//!         "info_bits_pos": [2, 4, 5, 6]
//!     }
//! }"#;
//! let config = DecoderConfig::from_json_str(json)?;
//! let bcjr = config.bcjr.as_ref().unwrap().build::<f32>()?;
//! assert_eq!(bcjr.num_steps(), 43);
//! let ldpc = config.ldpc.as_ref().unwrap().build::<f64>()?;
//! assert_eq!(ldpc.codeword_len(), 7);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bcjr::BcjrParams;
use crate::factory::{LdpcDecoder, SisoDecoder};
use crate::ldpc::LdpcParams;
use crate::maxstar::MaxStarKind;
use crate::pam::{Pam, PamParams};
use crate::tanner::TannerGraph;
use crate::trellis::Trellis;
use crate::update_rule::UpdateRuleKind;
use crate::{Error, Real};

/// Configuration of a BCJR decoder
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct BcjrConfig {
    /// Feedback and feedforward generator polynomials of the code
    pub polynomials: Vec<usize>,
    /// Decoder parameters
    #[serde(flatten)]
    pub params: BcjrParams,
    /// Max-star strategy
    pub max_star: MaxStarKind,
}

impl BcjrConfig {
    /// Builds the configured decoder.
    ///
    /// # Errors
    ///
    /// Returns an error if the polynomials or parameters are invalid.
    pub fn build<R: Real>(&self) -> Result<Box<dyn SisoDecoder<R>>, Error> {
        let trellis = Trellis::from_polynomials(&self.polynomials)?;
        self.max_star.build_bcjr_decoder(trellis, self.params)
    }
}

/// Configuration of a flooding LDPC decoder
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct LdpcConfig {
    /// Tanner graph of the code
    pub graph: TannerGraph,
    /// Iteration parameters
    #[serde(flatten)]
    pub params: LdpcParams,
    /// Check-node update rule
    pub update_rule: UpdateRuleKind,
    /// Positions of the information bits (empty if not needed)
    #[serde(default)]
    pub info_bits_pos: Vec<usize>,
}

impl LdpcConfig {
    /// Builds the configured decoder.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters, the update rule or the information bit positions are
    /// invalid.
    pub fn build<R: Real>(&self) -> Result<Box<dyn LdpcDecoder<R>>, Error> {
        self.update_rule.build_ldpc_decoder(
            self.graph.clone(),
            self.params,
            self.info_bits_pos.clone(),
        )
    }
}

/// Configuration of the decoding chain
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct DecoderConfig {
    /// BCJR decoder
    #[serde(default)]
    pub bcjr: Option<BcjrConfig>,
    /// LDPC decoder
    #[serde(default)]
    pub ldpc: Option<LdpcConfig>,
    /// PAM modem
    #[serde(default)]
    pub pam: Option<PamParams>,
}

impl DecoderConfig {
    /// Returns configuration parsed from a JSON string, after checking it.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid JSON for a configuration, or if the
    /// configuration is invalid (see [`Self::check`]).
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Returns configuration read from a JSON file, after checking it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, if its contents are not valid JSON for a
    /// configuration, or if the configuration is invalid (see [`Self::check`]).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        log::debug!("Reading decoder configuration from {}", path.display());
        let config: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        config.check()?;
        Ok(config)
    }

    /// Writes configuration to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Checks that every configured component can be built.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid component.
    pub fn check(&self) -> Result<(), Error> {
        if let Some(bcjr) = &self.bcjr {
            bcjr.build::<f64>()?;
        }
        if let Some(ldpc) = &self.ldpc {
            ldpc.params.check()?;
            ldpc.update_rule.check()?;
            ldpc.build::<f64>()?;
        }
        if let Some(pam) = &self.pam {
            pam.check()?;
        }
        Ok(())
    }

    /// Builds the configured PAM modem, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the modem parameters are invalid.
    pub fn build_pam<R: Real>(&self) -> Result<Option<Pam<R>>, Error> {
        self.pam.map(Pam::new).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bit;

    const JSON: &str = r#"{
        "bcjr": {
            "polynomials": [7, 5],
            "block_len": 10,
            "buffered_encoding": false,
            "max_star": "LogMAP"
        },
        "ldpc": {
            "graph": { "num_vars": 6, "checks": [[0, 1, 3], [1, 2, 4], [0, 4, 5], [2, 3, 5]] },
            "n_ite": 30,
            "enable_syndrome": true,
            "syndrome_depth": 1,
            "update_rule": "SumProduct"
        },
        "pam": { "bits_per_symbol": 2, "sigma": 0.8 }
    }"#;

    #[test]
    fn test_from_json_str() -> anyhow::Result<()> {
        let config = DecoderConfig::from_json_str(JSON)?;
        let bcjr = config.bcjr.as_ref().unwrap();
        assert_eq!(bcjr.polynomials, [7, 5]);
        assert_eq!(
            bcjr.params,
            BcjrParams {
                block_len: 10,
                buffered_encoding: false
            }
        );
        assert_eq!(bcjr.max_star, MaxStarKind::LogMAP);
        assert_eq!(bcjr.build::<f64>()?.num_steps(), 10);
        let ldpc = config.ldpc.as_ref().unwrap();
        assert!(ldpc.info_bits_pos.is_empty());
        let mut decoder = ldpc.build::<f32>()?;
        let llrs = [1.4, 1.4, -1.4, 1.4, -1.4, 1.4];
        let mut bits = [Bit::Zero; 6];
        assert!(decoder.decode_bits(&llrs, &mut bits).converged);
        assert_eq!(
            bits,
            [Bit::Zero, Bit::Zero, Bit::One, Bit::Zero, Bit::One, Bit::One]
        );
        let pam = config.build_pam::<f64>()?.unwrap();
        assert_eq!(pam.bits_per_symbol(), 2);
        Ok(())
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            DecoderConfig::from_json_str("{ \"bcjr\": 3 }"),
            Err(Error::SerdeReadWriteError(_))
        ));
        let bad_polynomials = JSON.replace("[7, 5]", "[7, 7]");
        assert!(matches!(
            DecoderConfig::from_json_str(&bad_polynomials),
            Err(Error::InvalidInput(_))
        ));
        let bad_block_len = JSON.replace("\"block_len\": 10", "\"block_len\": 0");
        assert!(matches!(
            DecoderConfig::from_json_str(&bad_block_len),
            Err(Error::InvalidInput(_))
        ));
        let bad_depth = JSON.replace("\"syndrome_depth\": 1", "\"syndrome_depth\": 0");
        assert!(DecoderConfig::from_json_str(&bad_depth).is_err());
        let bad_sigma = JSON.replace("0.8", "-0.8");
        assert!(DecoderConfig::from_json_str(&bad_sigma).is_err());
        let bad_graph = JSON.replace("[2, 3, 5]", "[2, 3, 6]");
        assert!(DecoderConfig::from_json_str(&bad_graph).is_err());
        assert!(matches!(
            DecoderConfig::from_json_file("/nonexistent/decoder.json"),
            Err(Error::FileReadWriteError(_))
        ));
    }

    #[test]
    fn test_json_file_round_trip() -> anyhow::Result<()> {
        let config = DecoderConfig::from_json_str(JSON)?;
        let path = std::env::temp_dir().join(format!("softdec-config-{}.json", std::process::id()));
        config.to_json_file(&path)?;
        let config_back = DecoderConfig::from_json_file(&path)?;
        std::fs::remove_file(&path)?;
        assert_eq!(config_back, config);
        assert_eq!(DecoderConfig::from_json_str("{}")?, DecoderConfig::default());
        Ok(())
    }
}

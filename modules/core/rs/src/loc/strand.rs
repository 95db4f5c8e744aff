use std::fmt::Display;

#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};
use eyre::{eyre, Report};

#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub enum Strand {
    /// The forward strand, also known as the positive strand or Watson strand.
    #[default]
    Forward,
    /// The reverse strand, also known as the negative strand or Crick strand.
    Reverse,
}

impl Strand {
    /// Get the symbolic representation of the strand.
    pub fn symbol(&self) -> char {
        match self {
            Self::Forward => '+',
            Self::Reverse => '-',
        }
    }

    /// Order a (left, right) pair of genomic values in the transcription direction,
    /// i.e. return (upstream, downstream).
    pub fn oriented<T>(&self, left: T, right: T) -> (T, T) {
        match self {
            Self::Forward => (left, right),
            Self::Reverse => (right, left),
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl TryFrom<char> for Strand {
    type Error = Report;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            '+' => Ok(Self::Forward),
            '-' => Ok(Self::Reverse),
            _ => Err(eyre!("Unknown strand symbol: {value:?}")),
        }
    }
}

impl TryFrom<&str> for Strand {
    type Error = Report;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "+" => Ok(Self::Forward),
            "-" => Ok(Self::Reverse),
            _ => Err(eyre!("Unknown strand symbol: {value:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strand_display() {
        assert_eq!(format!("{}", Strand::Forward), "+");
        assert_eq!(format!("{}", Strand::Reverse), "-");
    }

    #[test]
    fn test_strand_try_from() {
        assert_eq!(Strand::try_from('+').unwrap(), Strand::Forward);
        assert_eq!(Strand::try_from("-").unwrap(), Strand::Reverse);
        assert!(Strand::try_from('x').is_err());
        assert!(Strand::try_from(".").is_err());
    }

    #[test]
    fn test_strand_oriented() {
        assert_eq!(Strand::Forward.oriented(10, 20), (10, 20));
        assert_eq!(Strand::Reverse.oriented(10, 20), (20, 10));
    }
}

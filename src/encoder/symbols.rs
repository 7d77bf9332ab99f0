use super::EncoderDef;
use crate::error::{Error, Result};

/// Selected symbol per word position.
///
/// Positions enumerate like an odometer: the last position changes
/// fastest and the whole field wraps after the final combination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolField {
    alphabets: Vec<Vec<char>>,
    values: Vec<usize>,
}

impl SymbolField {
    pub fn new<S: AsRef<str>>(alphabets: &[S]) -> Self {
        let alphabets: Vec<Vec<char>> = alphabets
            .iter()
            .map(|a| a.as_ref().chars().collect())
            .collect();
        let values = vec![0; alphabets.len()];
        Self { alphabets, values }
    }

    /// One position per `A`/`D` character of the word format
    pub fn from_encoder(def: &EncoderDef) -> Self {
        let alphabets: Vec<&str> = (0..def.word_length())
            .filter_map(|i| def.alphabet(i))
            .collect();
        Self::new(&alphabets)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Index of the selected symbol at `position`
    pub fn get_sym(&self, position: usize) -> Option<usize> {
        self.values.get(position).copied()
    }

    pub fn symbol(&self, position: usize) -> Option<char> {
        let value = *self.values.get(position)?;
        self.alphabets[position]
            .get(value)
            .copied()
    }

    /// Select symbol `value` (wrapped to the alphabet) at `position`.
    /// Returns false when the position does not exist.
    pub fn set_sym(&mut self, position: usize, value: usize) -> bool {
        let (Some(alphabet), Some(slot)) =
            (self.alphabets.get(position), self.values.get_mut(position))
        else {
            return false;
        };
        *slot = value % alphabet.len().max(1);
        true
    }

    /// Select symbols from a word like `"01F0"`.
    pub fn set_word(&mut self, word: &str) -> Result<()> {
        let count = word.chars().count();
        if count != self.len() {
            return Err(Error::WordLength {
                expected: self.len(),
                actual: count,
            });
        }

        let mut values = Vec::with_capacity(self.len());
        for (position, symbol) in word.chars().enumerate() {
            let value = self.alphabets[position]
                .iter()
                .position(|&c| c.eq_ignore_ascii_case(&symbol))
                .ok_or(Error::InvalidSymbol { position, symbol })?;
            values.push(value);
        }

        self.values = values;
        Ok(())
    }

    /// Current selection as a string
    pub fn word(&self) -> String {
        (0..self.len())
            .filter_map(|i| self.symbol(i))
            .collect()
    }

    /// Select the first symbol everywhere
    pub fn clear(&mut self) {
        self.values.fill(0);
    }

    /// Number of distinct words, saturating
    pub fn possibilities_count(&self) -> u64 {
        self.alphabets
            .iter()
            .fold(1u64, |acc, a| acc.saturating_mul(a.len() as u64))
    }

    /// Step to the next word in odometer order
    pub fn set_next_possibility(&mut self) {
        for position in (0..self.len()).rev() {
            let size = self.alphabets[position].len();
            self.values[position] += 1;
            if self.values[position] < size {
                return;
            }
            self.values[position] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odometer_order_last_fastest() {
        let mut field = SymbolField::new(&["01", "01F"]);
        assert_eq!(field.possibilities_count(), 6);

        let mut words = vec![field.word()];
        for _ in 0..6 {
            field.set_next_possibility();
            words.push(field.word());
        }
        assert_eq!(words, ["00", "01", "0F", "10", "11", "1F", "00"]);
    }

    #[test]
    fn test_set_word_validates_symbols() {
        let mut field = SymbolField::new(&["01", "01F"]);
        field.set_word("1f").unwrap();
        assert_eq!(field.get_sym(0), Some(1));
        assert_eq!(field.get_sym(1), Some(2));

        assert!(matches!(
            field.set_word("1X"),
            Err(Error::InvalidSymbol { position: 1, symbol: 'X' })
        ));
        assert!(matches!(
            field.set_word("101"),
            Err(Error::WordLength { expected: 2, actual: 3 })
        ));
        assert!(matches!(
            field.set_word(""),
            Err(Error::WordLength { expected: 2, actual: 0 })
        ));
        assert_eq!(field.word(), "1F");
    }

    #[test]
    fn test_clear_and_set_sym() {
        let mut field = SymbolField::new(&["0123"; 3]);
        assert!(field.set_sym(1, 6));
        assert_eq!(field.word(), "020");
        field.clear();
        assert_eq!(field.word(), "000");
        assert_eq!(field.possibilities_count(), 64);
    }

    #[test]
    fn test_out_of_range_position() {
        let mut field = SymbolField::new(&["01", "01F"]);
        field.set_word("1F").unwrap();

        assert_eq!(field.get_sym(2), None);
        assert_eq!(field.symbol(2), None);
        assert!(!field.set_sym(2, 1));
        assert!(!field.set_sym(usize::MAX, 0));
        assert_eq!(field.word(), "1F");
    }
}

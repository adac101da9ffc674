use smallvec::SmallVec;

/// Fixed-dimension load vector. All amounts in a run share the dimension
/// declared by the first vehicle's capacity; arithmetic is componentwise on
/// signed 64-bit integers.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Amount(SmallVec<[i64; 4]>);

impl Amount {
    pub fn zero(dimensions: usize) -> Self {
        Amount(smallvec::smallvec![0; dimensions])
    }

    pub fn from_user(values: &[u32]) -> Self {
        Amount(values.iter().map(|&v| v as i64).collect())
    }

    pub fn from_vec(values: Vec<i64>) -> Self {
        Amount(SmallVec::from_vec(values))
    }

    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, index: usize) -> i64 {
        self.0[index]
    }

    pub fn values(&self) -> &[i64] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&v| v == 0)
    }

    /// Sum of all components, used for amount-based tie breaking.
    pub fn total(&self) -> i64 {
        self.0.iter().sum()
    }

    /// Componentwise `self <= other`.
    pub fn fits_in(&self, other: &Amount) -> bool {
        debug_assert_eq!(self.0.len(), other.0.len());
        self.0.iter().zip(&other.0).all(|(a, b)| a <= b)
    }

    pub fn add_assign(&mut self, other: &Amount) {
        debug_assert_eq!(self.0.len(), other.0.len());
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a += b;
        }
    }

    pub fn sub_assign(&mut self, other: &Amount) {
        debug_assert_eq!(self.0.len(), other.0.len());
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a -= b;
        }
    }

    pub fn plus(&self, other: &Amount) -> Amount {
        let mut out = self.clone();
        out.add_assign(other);
        out
    }

    pub fn minus(&self, other: &Amount) -> Amount {
        let mut out = self.clone();
        out.sub_assign(other);
        out
    }

    /// Componentwise minimum, in place.
    pub fn min_assign(&mut self, other: &Amount) {
        debug_assert_eq!(self.0.len(), other.0.len());
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a = (*a).min(*b);
        }
    }

    /// Componentwise maximum, in place.
    pub fn max_assign(&mut self, other: &Amount) {
        debug_assert_eq!(self.0.len(), other.0.len());
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a = (*a).max(*b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_in() {
        let a = Amount::from_vec(vec![3, 0, 2]);
        let cap = Amount::from_vec(vec![3, 1, 2]);
        assert!(a.fits_in(&cap));
        assert!(!cap.fits_in(&a));
        assert!(Amount::zero(3).fits_in(&a));
    }

    #[test]
    fn test_componentwise_arithmetic() {
        let mut a = Amount::from_vec(vec![1, 2]);
        a.add_assign(&Amount::from_vec(vec![3, -1]));
        assert_eq!(a, Amount::from_vec(vec![4, 1]));
        a.sub_assign(&Amount::from_vec(vec![4, 1]));
        assert!(a.is_zero());
    }

    #[test]
    fn test_min_max_assign() {
        let mut a = Amount::from_vec(vec![5, 1]);
        a.min_assign(&Amount::from_vec(vec![3, 2]));
        assert_eq!(a, Amount::from_vec(vec![3, 1]));
        a.max_assign(&Amount::from_vec(vec![4, 0]));
        assert_eq!(a, Amount::from_vec(vec![4, 1]));
    }
}

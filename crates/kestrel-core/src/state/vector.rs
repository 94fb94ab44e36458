//! Euclidean state

use rand::{Rng, RngCore};

use super::{Jacobians, Jcomponent, State};
use crate::error::{check_dim, ModelResult};
use crate::{DMat, DVec};

/// State living in ℝⁿˣ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateVector {
    nx: usize,
}

impl StateVector {
    pub fn new(nx: usize) -> Self {
        Self { nx }
    }

    fn check_pair(&self, a: &DVec, b: &DVec) -> ModelResult<()> {
        check_dim("x", self.nx, a.len())?;
        check_dim("x", self.nx, b.len())
    }

    fn identity_pair(&self, which: Jcomponent, first_sign: f64) -> Jacobians {
        let mut jac = Jacobians::allocate(self.nx, which);
        if which.first() {
            jac.first = DMat::identity(self.nx, self.nx) * first_sign;
        }
        if which.second() {
            jac.second = DMat::identity(self.nx, self.nx);
        }
        jac
    }
}

impl State for StateVector {
    fn nx(&self) -> usize {
        self.nx
    }

    fn ndx(&self) -> usize {
        self.nx
    }

    fn nq(&self) -> usize {
        self.nx
    }

    fn nv(&self) -> usize {
        0
    }

    fn zero(&self) -> DVec {
        DVec::zeros(self.nx)
    }

    fn rand(&self, rng: &mut dyn RngCore) -> DVec {
        DVec::from_fn(self.nx, |_, _| rng.gen_range(-1.0..=1.0))
    }

    fn diff(&self, x0: &DVec, x1: &DVec) -> ModelResult<DVec> {
        self.check_pair(x0, x1)?;
        Ok(x1 - x0)
    }

    fn integrate(&self, x: &DVec, dx: &DVec) -> ModelResult<DVec> {
        self.check_pair(x, dx)?;
        Ok(x + dx)
    }

    fn jdiff(&self, x0: &DVec, x1: &DVec, which: Jcomponent) -> ModelResult<Jacobians> {
        self.check_pair(x0, x1)?;
        Ok(self.identity_pair(which, -1.0))
    }

    fn jintegrate(&self, x: &DVec, dx: &DVec, which: Jcomponent) -> ModelResult<Jacobians> {
        self.check_pair(x, dx)?;
        Ok(self.identity_pair(which, 1.0))
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use type_map::TypeMap;

use crate::OptUnit;

/// A per-function analysis that can be computed on demand and cached.
pub trait Analysis {
    fn init(unit: &mut OptUnit<'_>) -> Self;
}

/// Lazily computed analyses, keyed by type and shared through `Rc`.
///
/// Passes request analyses with [`OptUnit::analysis`] and drop the cached
/// result with [`OptUnit::invalidate_structure`] whenever they change the
/// shape of the graph.
pub struct AnalysisCache {
    cache: RefCell<TypeMap>,
}

impl Default for AnalysisCache {
    fn default() -> Self {
        AnalysisCache {
            cache: RefCell::new(TypeMap::new()),
        }
    }
}

impl AnalysisCache {
    pub fn get<A: Analysis + 'static>(&self, unit: &mut OptUnit<'_>) -> Rc<A> {
        let cached = self.cache.borrow().get::<Rc<A>>().cloned();
        match cached {
            Some(analysis) => analysis,
            None => {
                let analysis = Rc::new(A::init(unit));
                self.cache.borrow_mut().insert(analysis.clone());
                analysis
            }
        }
    }

    pub fn invalidate<A: 'static>(&self) {
        self.cache.borrow_mut().remove::<Rc<A>>();
    }
}

//! Pages whose content lives entirely outside the 3D backdrop.
//!
//! The projects listing and case studies are ordinary scrolling pages; the
//! backdrop only shows the persistent world behind them. Each still loads a
//! named empty group so navigation and teardown behave uniformly.

use crate::scene::{LoadResult, PageContext, PageLoader};

pub fn empty_page(name: &'static str) -> PageLoader {
    Box::new(move |ctx: PageContext| {
        Box::pin(async move {
            let root = ctx.graph.borrow_mut().spawn(name);
            Ok(LoadResult::new(root))
        })
    })
}

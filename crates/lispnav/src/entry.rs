//
// entry.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
// The registry of evaluator functions we watch. Three entry points mark a
// Lisp call boundary; a handful of labelled statements inside them mark the
// argument and body evaluation sites the frame state machines stop at.
//

use std::fmt;

use scry::Location;
use strum_macros::EnumIter;

use crate::frame::FrameKind;

/// A recognised entry point of the embedded evaluator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter)]
pub enum EntryPoint {
    EvalSub,
    FuncallLambda,
    FuncallSubr,
}

impl EntryPoint {
    pub fn symbol(&self) -> &'static str {
        match self {
            EntryPoint::EvalSub => "eval_sub",
            EntryPoint::FuncallLambda => "funcall_lambda",
            EntryPoint::FuncallSubr => "funcall_subr",
        }
    }

    pub fn from_name(name: &str) -> Option<EntryPoint> {
        match name {
            "eval_sub" => Some(EntryPoint::EvalSub),
            "funcall_lambda" => Some(EntryPoint::FuncallLambda),
            "funcall_subr" => Some(EntryPoint::FuncallSubr),
            _ => None,
        }
    }

    pub fn is_recognised(name: &str) -> bool {
        EntryPoint::from_name(name).is_some()
    }

    /// The frame variant an invocation of this entry point becomes.
    pub fn kind(&self) -> FrameKind {
        match self {
            EntryPoint::EvalSub => FrameKind::Eval,
            EntryPoint::FuncallLambda => FrameKind::Lambda,
            EntryPoint::FuncallSubr => FrameKind::Subr,
        }
    }

    pub fn location(&self) -> Location {
        Location::symbol(self.symbol())
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A labelled argument or body evaluation site inside the evaluator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter)]
pub enum Site {
    SubrArgMany,
    SubrArgN,
    LambdaArgs,
    SubrBodyMany,
    SubrBodyN,
    SubrBodyUnevalled,
    LambdaBody,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiteRole {
    Arg,
    Body,
}

/// Which shape of callee a site belongs to: a built-in subroutine or a
/// cons-shaped (lambda) form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExprClass {
    Subr,
    Cons,
}

impl Site {
    pub fn location(&self) -> Location {
        match self {
            Site::SubrArgMany => Location::label("eval_sub", "func_subr_arg_many"),
            Site::SubrArgN => Location::label("eval_sub", "func_subr_arg_n"),
            Site::LambdaArgs => Location::label("apply_lambda", "func_lambda_args"),
            Site::SubrBodyMany => Location::label("eval_sub", "func_subr_body_many"),
            Site::SubrBodyN => Location::label("eval_sub", "func_subr_body_n"),
            Site::SubrBodyUnevalled => Location::label("eval_sub", "func_subr_body_unevalled"),
            Site::LambdaBody => Location::label("Fprogn", "func_lambda_body"),
        }
    }

    pub fn role(&self) -> SiteRole {
        match self {
            Site::SubrArgMany | Site::SubrArgN | Site::LambdaArgs => SiteRole::Arg,
            Site::SubrBodyMany | Site::SubrBodyN | Site::SubrBodyUnevalled | Site::LambdaBody => {
                SiteRole::Body
            },
        }
    }

    /// The body site that follows this argument site once the form's shape
    /// is known. Body sites have no pairing.
    pub fn paired_body(&self) -> Option<Site> {
        match self {
            Site::SubrArgMany => Some(Site::SubrBodyMany),
            Site::SubrArgN => Some(Site::SubrBodyN),
            Site::LambdaArgs => Some(Site::LambdaBody),
            _ => None,
        }
    }

    pub fn class(&self) -> ExprClass {
        match self {
            Site::LambdaArgs | Site::LambdaBody => ExprClass::Cons,
            _ => ExprClass::Subr,
        }
    }

    pub fn arg_sites() -> [Site; 3] {
        [Site::SubrArgMany, Site::SubrArgN, Site::LambdaArgs]
    }

    pub fn body_sites() -> [Site; 4] {
        [
            Site::SubrBodyMany,
            Site::SubrBodyN,
            Site::SubrBodyUnevalled,
            Site::LambdaBody,
        ]
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_recognises_the_three_entry_points() {
        assert!(EntryPoint::is_recognised("eval_sub"));
        assert!(EntryPoint::is_recognised("funcall_lambda"));
        assert!(EntryPoint::is_recognised("funcall_subr"));
        assert!(!EntryPoint::is_recognised("Fcons"));
        assert!(!EntryPoint::is_recognised(""));
    }

    #[test]
    fn test_entry_points_map_to_frame_kinds() {
        assert_eq!(EntryPoint::EvalSub.kind(), FrameKind::Eval);
        assert_eq!(EntryPoint::FuncallLambda.kind(), FrameKind::Lambda);
        assert_eq!(EntryPoint::FuncallSubr.kind(), FrameKind::Subr);
        assert_eq!(EntryPoint::iter().count(), 3);
    }

    #[test]
    fn test_every_arg_site_pairs_with_a_body_site() {
        for site in Site::arg_sites() {
            let body = site.paired_body().unwrap();
            assert_eq!(body.role(), SiteRole::Body);
            assert_eq!(body.class(), site.class());
        }
        for site in Site::body_sites() {
            assert_eq!(site.paired_body(), None);
        }
    }

    #[test]
    fn test_site_locations_sit_inside_the_evaluator() {
        assert_eq!(
            Site::SubrArgMany.location().to_string(),
            "eval_sub:func_subr_arg_many"
        );
        assert_eq!(
            Site::LambdaBody.location().to_string(),
            "Fprogn:func_lambda_body"
        );
        assert_eq!(Site::iter().count(), 7);
    }
}

mod test_advancing_front_basic;
